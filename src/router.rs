use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api;
use crate::state::AppState;

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Working" }))
}

/// Build the API router. Shared between `main` and the integration tests.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/api/add-query", post(api::queries::add_query_handler))
        .route("/api/queries", get(api::queries::list_queries_handler))
        .route("/api/my-queries", get(api::queries::my_queries_handler))
        .route("/api/query/{id}", get(api::queries::get_query_handler))
        // GET on the update path serves the edit form's prefetch.
        .route(
            "/api/update/{id}",
            get(api::queries::get_query_handler).put(api::queries::update_query_handler),
        )
        .route("/api/delete/{id}", delete(api::queries::delete_query_handler))
        .route(
            "/api/add-recommendation",
            post(api::recommendations::add_recommendation_handler),
        )
        .route(
            "/api/recommendations/{query_id}",
            get(api::recommendations::list_for_query_handler),
        )
        .route(
            "/api/my-recommendations/{email}",
            get(api::recommendations::list_by_recommender_handler),
        )
        .route(
            "/api/delete-rec/{id}/{query_id}",
            delete(api::recommendations::delete_recommendation_handler),
        )
        .route(
            "/api/recommended",
            get(api::recommendations::recommended_handler),
        )
        .with_state(state)
}
