//! API route definitions
//!
//! - /orchestrate - full pipeline run
//! - /agents/:name - single stage invocation
//! - /health - liveness and generator backend
//! - /config - active thresholds

use axum::{routing::{get, post}, Router};

use super::handlers::{self, AppState};

/// Create all API routes
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/orchestrate", post(handlers::orchestrate))
        .route("/agents/:name", post(handlers::invoke_stage))
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .with_state(state)
}
