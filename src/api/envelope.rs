//! Response bodies shared by the HTTP endpoints.
//!
//! Failures use one flat JSON shape, [`ApiError`]:
//! `{ "error": "...", "stage"?: "...", "code"?: "..." }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::agents::PipelineRun;
use crate::types::{EscalationPlan, Envelope, StageError, TraceEntry};

/// Successful `/orchestrate` body.
#[derive(Debug, Serialize)]
pub struct OrchestrateResponse {
    pub plan: EscalationPlan,
    pub approved: bool,
    pub trace: Vec<TraceEntry>,
    /// Every hop envelope in traversal order, seed message first
    pub full_pipeline: Vec<Envelope>,
}

impl From<PipelineRun> for OrchestrateResponse {
    fn from(run: PipelineRun) -> Self {
        Self {
            plan: run.plan,
            approved: run.approved,
            trace: run.trace,
            full_pipeline: run.hops,
        }
    }
}

/// Flat error body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    fn build(status: StatusCode, error: impl Into<String>) -> Response {
        let body = Self {
            error: error.into(),
            stage: None,
            code: None,
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn not_found(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, msg)
    }

    /// A pipeline run halted on a stage error.
    pub fn pipeline(err: StageError) -> Response {
        let body = Self {
            error: err.detail,
            stage: Some(err.stage),
            code: Some(err.code.to_string()),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}
