//! Stage trait and the five pipeline stages
//!
//! A stage consumes one Message and produces the next hop. The provided
//! `handle` method wraps `process` with envelope validation, fault capture
//! and the trace invariant (the incoming trace, untouched, plus exactly one
//! appended entry per successful hop).

pub mod compliance_filter;
pub mod escalation_planner;
pub mod normalizer;
pub mod notification_crafter;
pub mod risk_evaluator;

pub use compliance_filter::ComplianceFilter;
pub use escalation_planner::EscalationPlanner;
pub use normalizer::Normalizer;
pub use notification_crafter::NotificationCrafter;
pub use risk_evaluator::RiskEvaluator;

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::StageFault;
use crate::config::SafetyConfig;
use crate::llm::NotificationGenerator;
use crate::types::{Envelope, ErrorCode, Message, StageError};

/// Trait for pipeline stages
///
/// Implementors only write `process`; callers (orchestrator, HTTP surface,
/// tests) go through `handle` or `handle_value`, which never let a fault
/// escape as anything other than an Error envelope.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name used in `from`, trace entries and error envelopes
    fn name(&self) -> &'static str;

    /// Stage logic: consume a validated message, produce the next hop
    async fn process(&self, message: Message) -> Result<Message, StageFault>;

    /// Validate the envelope, run `process`, and convert every fault
    /// (including panics) into an Error envelope.
    async fn handle(&self, envelope: Envelope) -> Envelope {
        let message = match envelope {
            Envelope::Message(message) => message,
            Envelope::Error(err) => {
                return self.reject(format!(
                    "expected Message envelope, got Error from {} ({})",
                    err.stage, err.code
                ));
            }
        };
        if let Err(detail) = check_well_formed(&message) {
            return self.reject(detail);
        }

        let prior = message.trace.clone();
        let depth = prior.len();
        let intent = message.intent.clone();
        tracing::debug!(stage = self.name(), intent = %intent, "Stage received message");

        match AssertUnwindSafe(self.process(message)).catch_unwind().await {
            Ok(Ok(next))
                if next.trace.len() == depth + 1 && next.trace[..depth] == prior[..] =>
            {
                tracing::debug!(stage = self.name(), to = %next.to, intent = %next.intent, "Stage forwarded message");
                Envelope::Message(next)
            }
            Ok(Ok(next)) => self.fail(
                ErrorCode::ProcessFailed,
                format!(
                    "trace must extend the incoming {depth} entries by exactly one (produced {})",
                    next.trace.len()
                ),
            ),
            Ok(Err(fault)) => self.fail(fault.code(), fault.to_string()),
            Err(panic) => self.fail(ErrorCode::ProcessFailed, panic_message(panic.as_ref())),
        }
    }

    /// Parse an untyped envelope (as received over HTTP) and handle it.
    async fn handle_value(&self, value: serde_json::Value) -> Envelope {
        match serde_json::from_value::<Envelope>(value) {
            Ok(envelope) => self.handle(envelope).await,
            Err(e) => self.reject(format!("malformed envelope: {e}")),
        }
    }

    #[doc(hidden)]
    fn reject(&self, detail: String) -> Envelope {
        self.fail(ErrorCode::InvalidMessage, detail)
    }

    #[doc(hidden)]
    fn fail(&self, code: ErrorCode, detail: String) -> Envelope {
        tracing::warn!(stage = self.name(), code = %code, error = %detail, "Stage failed");
        Envelope::Error(StageError::new(self.name(), code, detail))
    }
}

/// Structural checks the envelope type alone cannot express.
fn check_well_formed(message: &Message) -> Result<(), String> {
    if message.from.trim().is_empty() {
        return Err("message has no sender".to_string());
    }
    if message.trace.is_empty() {
        return Err("message trace is empty".to_string());
    }
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}

/// Create the five pipeline stages in chain order.
pub fn default_stages(
    config: &SafetyConfig,
    generator: Arc<dyn NotificationGenerator>,
) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(Normalizer::new(config.normalizer.clone())),
        Box::new(RiskEvaluator::new(config.risk.clone())),
        Box::new(NotificationCrafter::new(generator, config.generator.timeout())),
        Box::new(EscalationPlanner::new(config.escalation.clone())),
        Box::new(ComplianceFilter::new()),
    ]
}
