//! Escalation Planner - tiered delivery ladder
//!
//! 1. push to the primary caregiver
//! 2. SMS to the secondary caregiver, same content as tier 1
//! 3. public post, only once unacknowledged time reaches the social threshold
//!
//! Steps are appended in tier order and never reordered or removed.

use async_trait::async_trait;
use tracing::info;

use super::Stage;
use crate::agents::StageFault;
use crate::config::EscalationConfig;
use crate::types::{
    Channel, EscalationPlan, Features, Intent, Message, NotificationContent, Payload, RiskState,
    StageId, Step, StepContent,
};

/// Stage 4: builds the `EscalationPlan`.
#[derive(Debug, Clone, Default)]
pub struct EscalationPlanner {
    config: EscalationConfig,
}

impl EscalationPlanner {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    /// Whether the public tier fires for this much unacknowledged time.
    pub fn social_tier_due(&self, seconds_unacknowledged: f64) -> bool {
        seconds_unacknowledged >= self.config.social_threshold_secs
    }

    /// Build the plan deterministically. States that do not require
    /// escalation get an empty ladder.
    pub fn plan(
        &self,
        state: RiskState,
        note: &NotificationContent,
        context: &Features,
    ) -> EscalationPlan {
        let mut plan = EscalationPlan::quiet(state);
        if !state.requires_escalation() {
            return plan;
        }

        let cfg = &self.config;
        plan.steps.push(Step {
            tier: 1,
            channel: Channel::Push,
            target: cfg.push.target.clone(),
            timeout_seconds: cfg.push.timeout_secs,
            content: StepContent::Notification(note.clone()),
        });
        plan.steps.push(Step {
            tier: 2,
            channel: Channel::Sms,
            target: cfg.sms.target.clone(),
            timeout_seconds: cfg.sms.timeout_secs,
            content: StepContent::Notification(note.clone()),
        });

        if self.social_tier_due(context.seconds_unacknowledged) {
            info!(
                seconds_unacknowledged = context.seconds_unacknowledged,
                threshold = cfg.social_threshold_secs,
                "Unacknowledged past threshold, adding public tier"
            );
            plan.steps.push(Step {
                tier: 3,
                channel: Channel::Social,
                target: cfg.social.handle.clone(),
                timeout_seconds: cfg.social.timeout_secs,
                content: StepContent::Post {
                    post: note.social_post.clone(),
                },
            });
        }

        plan
    }
}

#[async_trait]
impl Stage for EscalationPlanner {
    fn name(&self) -> &'static str {
        StageId::EscalationPlanner.as_str()
    }

    async fn process(&self, message: Message) -> Result<Message, StageFault> {
        let (state, note, context) = match message.payload {
            Payload::Notification { state, note, context } => (state, note, context),
            other => return Err(StageFault::unexpected("notification", &other)),
        };

        let plan = self.plan(state, &note, &context);
        info!(state = %plan.state, steps = plan.steps.len(), "Escalation plan built");

        Ok(Message::forward(
            message.trace,
            StageId::EscalationPlanner,
            StageId::ComplianceFilter,
            Intent::ApproveOutbound,
            Payload::Plan { plan, context },
        ))
    }
}
