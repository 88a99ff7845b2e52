use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use bson::Document;
use serde::Deserialize;

use crate::auth::middleware::{require_owner, AuthenticatedUser};
use crate::auth::verifier::VerifiedIdentity;
use crate::db::models::{
    AddQueryRequest, InsertedResponse, MessageResponse, Query, UpdateQueryRequest,
};
use crate::db::queries::QueryRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Core creation logic — separated from the HTTP layer for testability.
///
/// The claimed owner (`userEmail` in the payload) must match the verified
/// caller identity; an absent claim counts as a mismatch.
pub async fn process_add_query(
    repo: &dyn QueryRepository,
    identity: &VerifiedIdentity,
    query_data: Document,
) -> Result<InsertedResponse, AppError> {
    if query_data.is_empty() {
        return Err(AppError::BadRequest("queryData is required".to_string()));
    }

    let claimed_owner = query_data.get_str("userEmail").unwrap_or_default();
    require_owner(identity, claimed_owner)?;

    let inserted_id = repo.insert(query_data).await?;

    Ok(InsertedResponse {
        message: "Query added successfully".to_string(),
        inserted_id,
    })
}

pub async fn process_my_queries(
    repo: &dyn QueryRepository,
    identity: &VerifiedIdentity,
    email: Option<&str>,
) -> Result<Vec<Query>, AppError> {
    let email = match email {
        Some(email) if !email.is_empty() => email,
        _ => {
            return Err(AppError::BadRequest(
                "email query parameter is required".to_string(),
            ))
        }
    };

    require_owner(identity, email)?;
    repo.list_by_owner(email).await
}

pub async fn process_get_query(repo: &dyn QueryRepository, id: &str) -> Result<Query, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("query not found".to_string()))
}

/// Field-level merge of the supplied values into an existing query.
///
/// NotFound is decided by whether a document matched the id, so a merge
/// that changes nothing still succeeds.
pub async fn process_update_query(
    repo: &dyn QueryRepository,
    id: &str,
    updated_query: Document,
) -> Result<MessageResponse, AppError> {
    if updated_query.is_empty() {
        return Err(AppError::BadRequest("updatedQuery is required".to_string()));
    }

    let matched = repo.update_fields(id, updated_query).await?;
    if !matched {
        return Err(AppError::NotFound("query not found".to_string()));
    }

    Ok(MessageResponse {
        message: "Query updated successfully".to_string(),
    })
}

/// Removes the query only; dependent recommendations are left in place.
pub async fn process_delete_query(
    repo: &dyn QueryRepository,
    id: &str,
) -> Result<MessageResponse, AppError> {
    let removed = repo.delete(id).await?;
    if !removed {
        return Err(AppError::NotFound("query not found".to_string()));
    }

    Ok(MessageResponse {
        message: "Query deleted successfully".to_string(),
    })
}

// -- Axum handlers --

/// `POST /api/add-query`
pub async fn add_query_handler(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<AddQueryRequest>,
) -> Result<(StatusCode, Json<InsertedResponse>), AppError> {
    let response = process_add_query(state.queries.as_ref(), &identity, request.query_data).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/queries`
pub async fn list_queries_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Query>>, AppError> {
    let queries = state.queries.list_all().await?;
    Ok(Json(queries))
}

#[derive(Debug, Deserialize)]
pub struct MyQueriesParams {
    pub email: Option<String>,
}

/// `GET /api/my-queries?email=`
pub async fn my_queries_handler(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    axum::extract::Query(params): axum::extract::Query<MyQueriesParams>,
) -> Result<Json<Vec<Query>>, AppError> {
    let queries =
        process_my_queries(state.queries.as_ref(), &identity, params.email.as_deref()).await?;
    Ok(Json(queries))
}

/// `GET /api/query/{id}` (also served at `GET /api/update/{id}`)
pub async fn get_query_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Query>, AppError> {
    let query = process_get_query(state.queries.as_ref(), &id).await?;
    Ok(Json(query))
}

/// `PUT /api/update/{id}`
pub async fn update_query_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateQueryRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = process_update_query(state.queries.as_ref(), &id, request.updated_query).await?;
    Ok(Json(response))
}

/// `DELETE /api/delete/{id}`
pub async fn delete_query_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = process_delete_query(state.queries.as_ref(), &id).await?;
    Ok(Json(response))
}
