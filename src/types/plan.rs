//! Notification content and the tiered escalation plan

use serde::{Deserialize, Serialize};

use super::RiskState;

/// Maximum `title` length in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Maximum `body` length in characters.
pub const BODY_MAX_CHARS: usize = 200;
/// Maximum `socialPost` length in characters.
pub const SOCIAL_POST_MAX_CHARS: usize = 280;

/// Human-readable alert content. All three fields are non-empty once they
/// leave the notification crafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(rename = "socialPost")]
    pub social_post: String,
}

impl NotificationContent {
    /// All fields non-empty and within their length limits.
    pub fn is_deliverable(&self) -> bool {
        let within = |s: &str, max: usize| !s.trim().is_empty() && s.chars().count() <= max;
        within(&self.title, TITLE_MAX_CHARS)
            && within(&self.body, BODY_MAX_CHARS)
            && within(&self.social_post, SOCIAL_POST_MAX_CHARS)
    }
}

/// Delivery channel of one escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Push,
    Sms,
    Social,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Push => write!(f, "push"),
            Channel::Sms => write!(f, "sms"),
            Channel::Social => write!(f, "social"),
        }
    }
}

/// Content attached to a step: full notification for caregiver tiers,
/// a bare post for the public tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepContent {
    Notification(NotificationContent),
    Post { post: String },
}

/// One rung of the escalation ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub tier: u8,
    pub channel: Channel,
    pub target: String,
    pub timeout_seconds: u64,
    pub content: StepContent,
}

/// Ordered delivery plan. Steps are sorted by tier ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EscalationPlan {
    pub state: RiskState,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl EscalationPlan {
    /// Terminal plan with no delivery steps (SAFE / WATCH).
    pub fn quiet(state: RiskState) -> Self {
        Self { state, steps: Vec::new() }
    }

    pub fn tiers(&self) -> Vec<u8> {
        self.steps.iter().map(|s| s.tier).collect()
    }
}
