//! REST API module using Axum
//!
//! Exposes the agent pipeline over HTTP:
//! - `POST /orchestrate` runs the whole chain
//! - `POST /agents/:name` invokes one stage with a raw envelope
//! - `GET /health` and `GET /config` for operators

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::AppState;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Environment variable listing allowed cross-origin callers.
pub const CORS_ORIGINS_ENV: &str = "SAFETRACK_CORS_ORIGINS";

/// Build the CORS layer.
///
/// Set `SAFETRACK_CORS_ORIGINS` to a comma-separated list of allowed origins
/// (e.g. `http://localhost:5173` for a dashboard dev server). Without it any
/// origin may call the API, matching the in-vehicle dashboard deployment.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var(CORS_ORIGINS_ENV) {
        Ok(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base.allow_origin(Any),
    }
}

/// Create the complete application router.
pub fn create_app(state: AppState) -> Router {
    routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
