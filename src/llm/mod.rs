//! Text-Generation Capability Module
//!
//! The notification crafter delegates wording to an external text-generation
//! service. This module owns the seam: a constructor-injected
//! [`NotificationGenerator`] trait, the Google AI Studio backend, and a
//! disabled backend used when no API key is configured.
//!
//! ## Contract
//!
//! Input is a structured [`GenerationRequest`] (`state`, `reason`,
//! `context {gps?, outsideTempF}`); output is a string expected to parse as
//! `{title, body, socialPost}`. Every failure (transport, policy rejection,
//! malformed text, missing field, timeout) is a [`GenerationError`] and the
//! caller treats all of them identically: use the fallback template.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{GeneratorConfig, GeneratorProvider};
use crate::types::{Features, Gps, RiskState};

mod gemini;
pub mod prompt;

pub use gemini::GeminiGenerator;

// ============================================================================
// Error Types
// ============================================================================

/// Errors from the text-generation capability
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No backend configured (missing API key or provider disabled)
    #[error("Text generation unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Generation backend returned status {0}")]
    Status(reqwest::StatusCode),

    /// Backend refused the prompt (safety / policy block)
    #[error("Generation rejected by policy: {0}")]
    Rejected(String),

    /// Bounded wait expired
    #[error("Generation timeout after {0} ms")]
    Timeout(u64),

    /// Response text was not the expected JSON object
    #[error("Malformed generation response: {0}")]
    Malformed(String),

    /// A required field was missing, empty, or not a string
    #[error("Generation response field '{0}' missing or not a non-empty string")]
    MissingField(&'static str),
}

// ============================================================================
// Request
// ============================================================================

/// Context forwarded to the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<Gps>,
    pub outside_temp_f: f64,
}

impl From<&Features> for PromptContext {
    fn from(features: &Features) -> Self {
        Self {
            gps: features.gps,
            outside_temp_f: features.outside_temp_f,
        }
    }
}

/// Structured input to a generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub state: RiskState,
    pub reason: String,
    pub context: PromptContext,
}

// ============================================================================
// Capability trait
// ============================================================================

/// Injectable text-generation capability.
#[async_trait]
pub trait NotificationGenerator: Send + Sync {
    /// Produce raw text expected to parse as `{title, body, socialPost}`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Backend that is never available. Every ALERT uses the fallback template.
#[derive(Debug, Clone, Default)]
pub struct DisabledGenerator {
    reason: String,
}

impl DisabledGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl NotificationGenerator for DisabledGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}

/// Build the configured generator.
///
/// A missing API key downgrades to [`DisabledGenerator`] with a warning
/// rather than failing startup: fallback content keeps the pipeline usable.
pub fn build_generator(config: &GeneratorConfig) -> Arc<dyn NotificationGenerator> {
    match config.provider {
        GeneratorProvider::Disabled => {
            tracing::info!("Text generation disabled by config, fallback templates only");
            Arc::new(DisabledGenerator::new("provider disabled"))
        }
        GeneratorProvider::Gemini => match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => match GeminiGenerator::new(config, key) {
                Ok(generator) => {
                    tracing::info!(
                        model = %config.model,
                        timeout_ms = config.timeout_ms,
                        "Gemini notification generator ready"
                    );
                    Arc::new(generator)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to build Gemini client, fallback templates only");
                    Arc::new(DisabledGenerator::new(e.to_string()))
                }
            },
            _ => {
                tracing::warn!(
                    env = %config.api_key_env,
                    "Generator API key not set, fallback templates only"
                );
                Arc::new(DisabledGenerator::new(format!("{} not set", config.api_key_env)))
            }
        },
    }
}
