//! Compliance Filter - final outbound check
//!
//! Copies the plan, redacting raw coordinate pairs (bare, labelled or
//! bracketed) from push/SMS title and body text. GPS-derived text is only
//! allowed inside a URL or the public post. Also re-asserts the plan
//! structure before approving it; a malformed plan is a processing fault,
//! never silently repaired.

use async_trait::async_trait;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{info, warn};

use super::Stage;
use crate::agents::StageFault;
use crate::notification::clamp_chars;
use crate::types::{
    Channel, EscalationPlan, FinalPlan, Intent, Message, NotificationContent, Payload, StageId,
    StepContent, BODY_MAX_CHARS, TITLE_MAX_CHARS,
};

/// Replacement text for a redacted coordinate pair.
pub const REDACTED_LOCATION: &str = "[location withheld]";

/// Either a URL token (group 1) or a lat/lon pair. Pair groups: opening
/// paren (2), lat label (3), latitude (4), lon label (5), longitude (6),
/// closing paren (7).
fn coordinate_pair() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)(https?://\S+)",
            r"|(\(\s*)?(\blat(?:itude)?\s*[:=]?\s*)?(-?\b\d{1,3}(?:\.\d+)?)\b",
            r"(?:\s*,\s*|\s+)",
            r"(\blon(?:g(?:itude)?)?\s*[:=]?\s*)?(-?\b\d{1,3}(?:\.\d+)?)\b(\s*\))?",
        ))
        .expect("coordinate pattern is valid")
    })
}

/// Whether a matched pair reads as a GPS fix rather than two loose numbers.
fn is_coordinate(caps: &Captures) -> bool {
    let (Some(lat), Some(lon)) = (caps.get(4), caps.get(6)) else {
        return false;
    };
    let in_range = match (lat.as_str().parse::<f64>(), lon.as_str().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => lat.abs() <= 90.0 && lon.abs() <= 180.0,
        _ => false,
    };
    let labelled = caps.get(3).is_some() || caps.get(5).is_some();
    let bracketed = caps.get(2).is_some() && caps.get(7).is_some();
    let decimal = lat.as_str().contains('.') || lon.as_str().contains('.');
    in_range && (labelled || bracketed || decimal)
}

/// Replace raw coordinate pairs. URLs (map links included) pass through whole.
pub fn redact_coordinates(text: &str) -> String {
    coordinate_pair()
        .replace_all(text, |caps: &Captures| {
            if caps.get(1).is_none() && is_coordinate(caps) {
                REDACTED_LOCATION.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Stage 5: approves the plan and returns it to the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceFilter;

impl ComplianceFilter {
    pub fn new() -> Self {
        Self
    }

    /// Sanitized copy of the plan.
    pub fn sanitize(&self, plan: &EscalationPlan) -> EscalationPlan {
        let mut clean = plan.clone();
        for step in &mut clean.steps {
            if let StepContent::Notification(note) = &mut step.content {
                let redacted = NotificationContent {
                    title: clamp_chars(&redact_coordinates(&note.title), TITLE_MAX_CHARS),
                    body: clamp_chars(&redact_coordinates(&note.body), BODY_MAX_CHARS),
                    social_post: note.social_post.clone(),
                };
                if redacted != *note {
                    warn!(tier = step.tier, channel = %step.channel, "Redacted raw coordinates from outbound content");
                    *note = redacted;
                }
            }
        }
        clean
    }

    /// Structural checks the planner must already satisfy.
    pub fn check(&self, plan: &EscalationPlan) -> Result<(), StageFault> {
        if !plan.state.requires_escalation() && !plan.steps.is_empty() {
            return Err(StageFault::Invariant(format!(
                "{} plan must not carry delivery steps",
                plan.state
            )));
        }
        let mut last_tier = 0;
        for step in &plan.steps {
            if step.tier <= last_tier {
                return Err(StageFault::Invariant(format!(
                    "tiers must be strictly ascending (tier {} after {})",
                    step.tier, last_tier
                )));
            }
            last_tier = step.tier;

            match (step.tier, step.channel, &step.content) {
                (1, Channel::Push, StepContent::Notification(note))
                | (2, Channel::Sms, StepContent::Notification(note))
                    if note.is_deliverable() => {}
                (3, Channel::Social, StepContent::Post { post }) if !post.trim().is_empty() => {}
                (tier, channel, _) => {
                    return Err(StageFault::Invariant(format!(
                        "tier {tier} on {channel} carries unexpected or empty content"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for ComplianceFilter {
    fn name(&self) -> &'static str {
        StageId::ComplianceFilter.as_str()
    }

    async fn process(&self, message: Message) -> Result<Message, StageFault> {
        let (plan, context) = match message.payload {
            Payload::Plan { plan, context } => (plan, context),
            other => return Err(StageFault::unexpected("plan", &other)),
        };

        self.check(&plan)?;
        let plan = self.sanitize(&plan);
        info!(state = %plan.state, tiers = ?plan.tiers(), "Plan approved");

        Ok(Message::forward(
            message.trace,
            StageId::ComplianceFilter,
            StageId::Orchestrator,
            Intent::FinalPlan,
            Payload::Final(FinalPlan {
                approved: true,
                plan,
                context,
            }),
        ))
    }
}
