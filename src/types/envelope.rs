//! Inter-stage envelope: Message, StageError, TraceEntry and typed payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EscalationPlan, Features, NotificationContent, RawTelemetry, RiskDecision, RiskState};

// ============================================================================
// Stage identifiers and intents
// ============================================================================

/// Well-known hop names used in `from` / `to` and in trace entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Client,
    Normalizer,
    RiskEvaluator,
    NotificationCrafter,
    EscalationPlanner,
    ComplianceFilter,
    Orchestrator,
}

impl StageId {
    pub const fn as_str(self) -> &'static str {
        match self {
            StageId::Client => "Client",
            StageId::Normalizer => "Normalizer",
            StageId::RiskEvaluator => "RiskEvaluator",
            StageId::NotificationCrafter => "NotificationCrafter",
            StageId::EscalationPlanner => "EscalationPlanner",
            StageId::ComplianceFilter => "ComplianceFilter",
            StageId::Orchestrator => "ORCHESTRATOR",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic action names carried in `intent`. Observability metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Start,
    NormalizeTelemetry,
    EvaluateRisk,
    CraftMessage,
    DeliverOrEscalate,
    ApproveOutbound,
    FinalPlan,
}

impl Intent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Intent::Start => "START",
            Intent::NormalizeTelemetry => "NORMALIZE_TELEMETRY",
            Intent::EvaluateRisk => "EVALUATE_RISK",
            Intent::CraftMessage => "CRAFT_MESSAGE",
            Intent::DeliverOrEscalate => "DELIVER_OR_ESCALATE",
            Intent::ApproveOutbound => "APPROVE_OUTBOUND",
            Intent::FinalPlan => "FINAL_PLAN",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// The only unit exchanged between stages.
///
/// Serialized with a `kind` discriminator: `{"kind": "Message", ...}` or
/// `{"kind": "Error", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Envelope {
    Message(Message),
    Error(StageError),
}

impl Envelope {
    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error(_))
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        Envelope::Message(message)
    }
}

impl From<StageError> for Envelope {
    fn from(error: StageError) -> Self {
        Envelope::Error(error)
    }
}

/// One hop in the traversal log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub stage: String,
    pub intent: String,
    pub timestamp: DateTime<Utc>,
}

impl TraceEntry {
    pub fn now(stage: &str, intent: Intent) -> Self {
        Self {
            stage: stage.to_string(),
            intent: intent.as_str().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A successful inter-stage message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    /// Advisory routing metadata; stages never enforce it.
    pub to: String,
    pub intent: String,
    pub payload: Payload,
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

impl Message {
    /// Seed message for a pipeline run: trace starts with `Client/START`.
    pub fn start(telemetry: RawTelemetry, acked: bool) -> Self {
        Self {
            from: StageId::Client.as_str().to_string(),
            to: StageId::Normalizer.as_str().to_string(),
            intent: Intent::NormalizeTelemetry.as_str().to_string(),
            payload: Payload::Telemetry { telemetry, acked },
            trace: vec![TraceEntry::now(StageId::Client.as_str(), Intent::Start)],
        }
    }

    /// Build the next hop, appending exactly one trace entry for `from`.
    pub fn forward(
        trace: Vec<TraceEntry>,
        from: StageId,
        to: StageId,
        intent: Intent,
        payload: Payload,
    ) -> Self {
        let mut trace = trace;
        trace.push(TraceEntry::now(from.as_str(), intent));
        Self {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            intent: intent.as_str().to_string(),
            payload,
            trace,
        }
    }

    /// True when this message carries the approved plan back to the caller.
    pub fn is_final(&self) -> bool {
        matches!(self.payload, Payload::Final(_))
    }
}

// ============================================================================
// Error envelope
// ============================================================================

/// The two pipeline error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing envelope at a stage boundary.
    InvalidMessage,
    /// Uncaught fault inside a stage's logic.
    ProcessFailed,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidMessage => write!(f, "INVALID_MESSAGE"),
            ErrorCode::ProcessFailed => write!(f, "PROCESS_FAILED"),
        }
    }
}

/// Error envelope body. Halts the chain when returned by any stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{stage} failed with {code}: {detail}")]
pub struct StageError {
    pub stage: String,
    pub code: ErrorCode,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl StageError {
    pub fn new(stage: &str, code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            code,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Typed payloads
// ============================================================================

/// Stage-specific payload, one variant per stage boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Client -> Normalizer
    Telemetry {
        #[serde(default)]
        telemetry: RawTelemetry,
        #[serde(default)]
        acked: bool,
    },
    /// Normalizer -> RiskEvaluator
    Features {
        features: Features,
        #[serde(default)]
        acked: bool,
    },
    /// RiskEvaluator -> NotificationCrafter
    Decision(RiskDecision),
    /// NotificationCrafter -> EscalationPlanner
    Notification {
        state: RiskState,
        note: NotificationContent,
        context: Features,
    },
    /// EscalationPlanner -> ComplianceFilter
    Plan {
        plan: EscalationPlan,
        context: Features,
    },
    /// RiskEvaluator or ComplianceFilter -> Orchestrator
    Final(FinalPlan),
}

impl Payload {
    /// Short variant name for logs and error details.
    pub const fn kind(&self) -> &'static str {
        match self {
            Payload::Telemetry { .. } => "telemetry",
            Payload::Features { .. } => "features",
            Payload::Decision(_) => "decision",
            Payload::Notification { .. } => "notification",
            Payload::Plan { .. } => "plan",
            Payload::Final(_) => "final",
        }
    }
}

/// Terminal payload handed back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPlan {
    pub approved: bool,
    pub plan: EscalationPlan,
    pub context: Features,
}
