//! Notification Crafter - alert wording with a deterministic fallback
//!
//! The only suspension point in the chain. The generator call is bounded by
//! `tokio::time::timeout`; a timeout, a transport error, a policy rejection
//! and an invalid response all take the same path: the fallback template.
//! Capability faults never leave this stage.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::Stage;
use crate::agents::StageFault;
use crate::llm::{GenerationError, GenerationRequest, NotificationGenerator, PromptContext};
use crate::notification::{fallback_notification, parse_notification};
use crate::types::{Features, Intent, Message, NotificationContent, Payload, RiskState, StageId};

/// Stage 3: turns a risk decision into `NotificationContent`.
#[derive(Clone)]
pub struct NotificationCrafter {
    generator: Arc<dyn NotificationGenerator>,
    timeout: Duration,
}

impl NotificationCrafter {
    pub fn new(generator: Arc<dyn NotificationGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Produce deliverable content. Infallible: faults become the fallback.
    pub async fn craft(&self, state: RiskState, reason: &str, context: &Features) -> NotificationContent {
        match self.generate(state, reason, context).await {
            Ok(note) => {
                info!(backend = self.generator.backend_name(), "Notification generated");
                note
            }
            Err(e) => {
                warn!(
                    backend = self.generator.backend_name(),
                    error = %e,
                    "Notification generation failed, using fallback template"
                );
                fallback_notification(state, reason, context)
            }
        }
    }

    async fn generate(
        &self,
        state: RiskState,
        reason: &str,
        context: &Features,
    ) -> Result<NotificationContent, GenerationError> {
        let request = GenerationRequest {
            state,
            reason: reason.to_string(),
            context: PromptContext::from(context),
        };
        let raw = tokio::time::timeout(self.timeout, self.generator.generate(&request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_millis() as u64))??;
        parse_notification(&raw)
    }
}

#[async_trait]
impl Stage for NotificationCrafter {
    fn name(&self) -> &'static str {
        StageId::NotificationCrafter.as_str()
    }

    async fn process(&self, message: Message) -> Result<Message, StageFault> {
        let decision = match message.payload {
            Payload::Decision(decision) => decision,
            other => return Err(StageFault::unexpected("decision", &other)),
        };

        let note = self
            .craft(decision.state, &decision.reason, &decision.context)
            .await;

        Ok(Message::forward(
            message.trace,
            StageId::NotificationCrafter,
            StageId::EscalationPlanner,
            Intent::DeliverOrEscalate,
            Payload::Notification {
                state: decision.state,
                note,
                context: decision.context,
            },
        ))
    }
}
