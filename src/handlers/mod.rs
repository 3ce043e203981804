pub mod generation;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::AppState;

/// Routes of the JSON API
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/generate-questions", post(generation::generate_questions))
        .route("/api/generate-questions/jobs", get(generation::list_jobs))
        .route("/api/generate-questions/jobs/:id", get(generation::get_job))
        .with_state(state)
}

/// Liveness and readiness probes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check)).route("/ready", get(ready_check))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ready_check() -> &'static str {
    "READY"
}
