use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::Document;
use serde::Deserialize;

use crate::db::models::{
    AddRecommendationRequest, InsertedResponse, MessageResponse, Recommendation, RecommendedEntry,
};
use crate::db::queries::QueryRepository;
use crate::db::recommendations::RecommendationRepository;
use crate::error::AppError;
use crate::state::AppState;

const COUNTER_ADJUST_ATTEMPTS: u32 = 3;

/// Best-effort adjustment of a query's cached recommendationCount.
///
/// The primary write (insert or delete of a recommendation) has already
/// succeeded when this runs, so a persistent failure here is logged and
/// swallowed rather than failing the request. The counter is a cache; the
/// authoritative value is a recount over the recommendations collection.
async fn adjust_count_with_retry(repo: &dyn QueryRepository, query_id: &str, delta: i64) {
    for attempt in 1..=COUNTER_ADJUST_ATTEMPTS {
        match repo.adjust_recommendation_count(query_id, delta).await {
            Ok(()) => return,
            Err(e) if attempt < COUNTER_ADJUST_ATTEMPTS => {
                tracing::warn!(
                    "recommendationCount adjustment for query {query_id} failed (attempt {attempt}): {e}"
                );
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
            }
            Err(e) => {
                tracing::error!(
                    "giving up on recommendationCount adjustment for query {query_id} (delta {delta}): {e}"
                );
            }
        }
    }
}

pub async fn process_add_recommendation(
    queries: &dyn QueryRepository,
    recommendations: &dyn RecommendationRepository,
    recommendation_data: Document,
) -> Result<InsertedResponse, AppError> {
    if recommendation_data.is_empty() {
        return Err(AppError::BadRequest(
            "recommendationData is required".to_string(),
        ));
    }

    let query_id = recommendation_data
        .get_str("queryId")
        .unwrap_or_default()
        .to_string();
    if query_id.is_empty() {
        return Err(AppError::BadRequest(
            "recommendationData.queryId is required".to_string(),
        ));
    }

    let inserted_id = recommendations.insert(recommendation_data).await?;
    adjust_count_with_retry(queries, &query_id, 1).await;

    Ok(InsertedResponse {
        message: "Recommendation added successfully".to_string(),
        inserted_id,
    })
}

/// Deletes a recommendation, then decrements the counter of the query the
/// caller names. The query id comes from the route, not from the deleted
/// document, so a mismatched id adjusts the wrong query's counter.
pub async fn process_delete_recommendation(
    queries: &dyn QueryRepository,
    recommendations: &dyn RecommendationRepository,
    id: &str,
    query_id: &str,
) -> Result<MessageResponse, AppError> {
    let removed = recommendations.delete(id).await?;
    if !removed {
        return Err(AppError::NotFound("recommendation not found".to_string()));
    }

    adjust_count_with_retry(queries, query_id, -1).await;

    Ok(MessageResponse {
        message: "Recommendation deleted successfully".to_string(),
    })
}

/// The aggregate "recommended" view: every query owned by `user_email`
/// paired with its recommendations. One dependent lookup per query, run
/// concurrently and reassembled in the original query order.
pub async fn process_recommended(
    queries: &dyn QueryRepository,
    recommendations: &dyn RecommendationRepository,
    user_email: Option<&str>,
) -> Result<Vec<RecommendedEntry>, AppError> {
    let user_email = match user_email {
        Some(email) if !email.is_empty() => email,
        _ => {
            return Err(AppError::BadRequest(
                "userEmail query parameter is required".to_string(),
            ))
        }
    };

    let owned = queries.list_by_owner(user_email).await?;

    let lookups = owned.iter().map(|query| {
        let query_id = query.hex_id();
        async move {
            let recs = recommendations.list_by_query(&query_id).await?;
            Ok::<_, AppError>((query_id, recs))
        }
    });
    let joined = futures::future::try_join_all(lookups).await?;

    let entries = owned
        .into_iter()
        .zip(joined)
        .map(|(query, (query_id, recs))| RecommendedEntry {
            query_title: query.query_title,
            product_name: query.product_name,
            product_brand: query.product_brand,
            query_id,
            recommendations: recs,
        })
        .collect();

    Ok(entries)
}

// -- Axum handlers --

/// `POST /api/add-recommendation`
pub async fn add_recommendation_handler(
    State(state): State<AppState>,
    Json(request): Json<AddRecommendationRequest>,
) -> Result<(StatusCode, Json<InsertedResponse>), AppError> {
    let response = process_add_recommendation(
        state.queries.as_ref(),
        state.recommendations.as_ref(),
        request.recommendation_data,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/recommendations/{queryId}`
pub async fn list_for_query_handler(
    State(state): State<AppState>,
    Path(query_id): Path<String>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let recommendations = state.recommendations.list_by_query(&query_id).await?;
    Ok(Json(recommendations))
}

/// `GET /api/my-recommendations/{email}`
pub async fn list_by_recommender_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let recommendations = state.recommendations.list_by_recommender(&email).await?;
    Ok(Json(recommendations))
}

/// `DELETE /api/delete-rec/{id}/{queryId}`
pub async fn delete_recommendation_handler(
    State(state): State<AppState>,
    Path((id, query_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = process_delete_recommendation(
        state.queries.as_ref(),
        state.recommendations.as_ref(),
        &id,
        &query_id,
    )
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedParams {
    pub user_email: Option<String>,
}

/// `GET /api/recommended?userEmail=`
pub async fn recommended_handler(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<RecommendedParams>,
) -> Result<Json<Vec<RecommendedEntry>>, AppError> {
    let entries = process_recommended(
        state.queries.as_ref(),
        state.recommendations.as_ref(),
        params.user_email.as_deref(),
    )
    .await?;
    Ok(Json(entries))
}
