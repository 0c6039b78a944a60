//! HTTP surface for a docforge-generated API.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Json;
use axum::routing::{get, post};
use docforge_engine::GeneratedApi;
use tracing::debug;

async fn graphql_handler(
    State(api): State<Arc<GeneratedApi>>,
    headers: HeaderMap,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let credential = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let response = api.execute(request, credential).await;
    if response.is_err() {
        debug!(errors = response.errors.len(), "request completed with errors");
    }
    Json(response)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Build the HTTP router serving `api` at `/graphql`.
pub fn build_router(api: Arc<GeneratedApi>) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/health", get(health_handler))
        .with_state(api)
}
