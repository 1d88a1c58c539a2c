// ABOUTME: Route definitions for the promptlab HTTP API.
// ABOUTME: Assembles all API routes into a single Axum Router with shared state and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/playground/execute", post(api::playground::execute))
        .route("/api/playground/preview", post(api::playground::preview))
        .route("/api/playground/variables", post(api::playground::variables))
        .route(
            "/api/providers",
            get(api::providers::list_providers).post(api::providers::register_provider),
        )
        .route("/api/providers/models", get(api::providers::list_models))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
