//! Agent pipeline for in-vehicle child-safety escalation
//!
//! ## Stages (fixed order)
//!
//! 1. **Normalizer**: raw telemetry to canonical `Features`
//! 2. **RiskEvaluator**: SAFE / WATCH / ALERT state machine (SAFE and WATCH end the chain)
//! 3. **NotificationCrafter**: alert wording via the text-generation capability, with fallback
//! 4. **EscalationPlanner**: push, SMS, then public tier gated on unacknowledged time
//! 5. **ComplianceFilter**: sanitizes and approves the plan for the orchestrator
//!
//! Each stage implements the `Stage` trait (see `agents::stages`) and is
//! independently invocable with a single `Envelope`. The `Orchestrator`
//! is the only component that knows the chain order.

pub mod orchestrator;
pub mod stages;

pub use orchestrator::{Orchestrator, PipelineRun};
pub use stages::{
    ComplianceFilter, EscalationPlanner, Normalizer, NotificationCrafter, RiskEvaluator, Stage,
};

use thiserror::Error;

use crate::types::ErrorCode;

/// Fault raised inside a stage's processing logic.
///
/// Never escapes a stage: `Stage::handle` converts it into an Error
/// envelope tagged with the stage name.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageFault {
    /// Payload variant does not match what this stage consumes
    #[error("expected {expected} payload, got {actual}")]
    UnexpectedPayload {
        expected: &'static str,
        actual: &'static str,
    },

    /// Stage output would violate a pipeline invariant
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Any other failure inside stage logic
    #[error("{0}")]
    Failed(String),
}

impl StageFault {
    /// Pipeline error code this fault is reported under.
    pub const fn code(&self) -> ErrorCode {
        match self {
            StageFault::UnexpectedPayload { .. } => ErrorCode::InvalidMessage,
            StageFault::Invariant(_) | StageFault::Failed(_) => ErrorCode::ProcessFailed,
        }
    }

    pub(crate) fn unexpected(expected: &'static str, actual: &crate::types::Payload) -> Self {
        StageFault::UnexpectedPayload {
            expected,
            actual: actual.kind(),
        }
    }
}
