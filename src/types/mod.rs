//! Shared data structures for the child-safety escalation pipeline
//!
//! This module defines the types exchanged between pipeline stages:
//! - Stage 0: Envelope / Message / StageError (uniform inter-stage shape)
//! - Stage 1: RawTelemetry -> Features (normalizer output)
//! - Stage 2: RiskState, RiskDecision (risk evaluator output)
//! - Stage 3: NotificationContent (notification crafter output)
//! - Stage 4-5: EscalationPlan, Step, FinalPlan (planner and compliance output)

mod envelope;
mod telemetry;
mod risk;
mod plan;

pub use envelope::*;
pub use telemetry::*;
pub use risk::*;
pub use plan::*;
