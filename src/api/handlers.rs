//! API route handlers
//!
//! - `POST /orchestrate`: run the full chain for one telemetry reading
//! - `POST /agents/:name`: invoke a single stage with a raw envelope
//! - `GET /health`, `GET /config`: liveness and active thresholds

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::envelope::{ApiError, OrchestrateResponse};
use crate::agents::Orchestrator;
use crate::config::SafetyConfig;
use crate::types::RawTelemetry;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<SafetyConfig>,
    /// Name of the text-generation backend in use
    pub generator_backend: &'static str,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        config: Arc<SafetyConfig>,
        generator_backend: &'static str,
    ) -> Self {
        Self {
            orchestrator,
            config,
            generator_backend,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Body of `POST /orchestrate`.
#[derive(Debug, Deserialize)]
pub struct OrchestrateRequest {
    #[serde(default)]
    pub telemetry: RawTelemetry,
    #[serde(default)]
    pub acked: bool,
}

/// POST /orchestrate - run Normalizer through ComplianceFilter
pub async fn orchestrate(
    State(state): State<AppState>,
    body: Result<Json<OrchestrateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()),
    };

    match state.orchestrator.run(request.telemetry, request.acked).await {
        Ok(run) => Json(OrchestrateResponse::from(run)).into_response(),
        Err(err) => ApiError::pipeline(err),
    }
}

/// POST /agents/:name - invoke one stage directly
///
/// The stage answers with a Message or an Error envelope; both are 200
/// because the stage itself produced the answer.
pub async fn invoke_stage(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let Some(stage) = state.orchestrator.stage(&name) else {
        return ApiError::not_found(format!("Unknown agent: {name}"));
    };
    let Json(value) = match body {
        Ok(json) => json,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()),
    };

    let envelope = stage.handle_value(value).await;
    info!(stage = %name, error = envelope.is_error(), "Direct stage invocation");
    Json(envelope).into_response()
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub generator: &'static str,
    pub stages: Vec<&'static str>,
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        generator: state.generator_backend,
        stages: state.orchestrator.stage_names(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// GET /config - active thresholds and generator settings
///
/// Only the name of the API key variable is exposed, never its value.
pub async fn get_config(State(state): State<AppState>) -> Json<SafetyConfig> {
    Json(state.config.as_ref().clone())
}
