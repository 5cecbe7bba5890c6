//! SafeTrack: in-vehicle child-safety escalation
//!
//! A fixed chain of single-purpose stages turns one telemetry reading into
//! an approved escalation plan (which notification tiers fire, in what
//! order, with what content).
//!
//! ## Architecture
//!
//! - **Agents**: Normalizer, RiskEvaluator, NotificationCrafter,
//!   EscalationPlanner, ComplianceFilter, and the Orchestrator that chains them
//! - **LLM Module**: injectable text-generation capability for alert wording
//! - **Notification**: response validation and deterministic fallback content
//! - **API**: axum HTTP surface for the pipeline and individual stages

pub mod agents;
pub mod api;
pub mod config;
pub mod llm;
pub mod notification;
pub mod types;

// Re-export configuration
pub use config::SafetyConfig;

// Re-export commonly used types
pub use types::{
    Channel, Envelope, ErrorCode, EscalationPlan, Features, Message, NotificationContent,
    RawTelemetry, RiskState, StageError, Step, StepContent,
};

// Re-export agents
pub use agents::{Orchestrator, PipelineRun, Stage};

// Re-export LLM components
pub use llm::{build_generator, NotificationGenerator};
