//! Risk states and the risk evaluator's decision

use serde::{Deserialize, Serialize};

use super::Features;

/// Risk classification for a single evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskState {
    #[default]
    Safe,
    Watch,
    Alert,
    /// Reserved vocabulary; the current policy never produces it.
    Critical,
}

impl RiskState {
    /// States that require notification crafting and an escalation ladder.
    pub const fn requires_escalation(self) -> bool {
        matches!(self, RiskState::Alert | RiskState::Critical)
    }
}

impl std::fmt::Display for RiskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskState::Safe => write!(f, "SAFE"),
            RiskState::Watch => write!(f, "WATCH"),
            RiskState::Alert => write!(f, "ALERT"),
            RiskState::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Risk evaluator output forwarded to the notification crafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    pub state: RiskState,
    pub reason: String,
    pub context: Features,
}
