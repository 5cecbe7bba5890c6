//! Risk Evaluator - the SAFE / WATCH / ALERT state machine
//!
//! Guard clauses in strict priority order, first match wins:
//!
//! | # | Condition                         | State | Chain            |
//! |---|-----------------------------------|-------|------------------|
//! | 1 | child not present                 | SAFE  | ends             |
//! | 2 | outside temperature < threshold   | SAFE  | ends             |
//! | 3 | caregiver acknowledged            | WATCH | ends, no steps   |
//! | 4 | otherwise                         | ALERT | to the crafter   |
//!
//! Presence and temperature must be checked before acknowledgment, and
//! acknowledgment before the moving/still distinction.

use async_trait::async_trait;
use tracing::info;

use super::Stage;
use crate::agents::StageFault;
use crate::config::RiskConfig;
use crate::types::{
    EscalationPlan, Features, FinalPlan, Intent, Message, Payload, RiskDecision, RiskState,
    StageId,
};

/// Classify one feature set. Pure: identical inputs give identical output.
pub fn evaluate(features: &Features, acked: bool, threshold_f: f64) -> RiskDecision {
    let t_out = features.outside_temp_f;

    let (state, reason) = if !features.present {
        (RiskState::Safe, "Child not present (seat unbuckled).".to_string())
    } else if t_out < threshold_f {
        (
            RiskState::Safe,
            format!("Temperature {t_out}F is below {threshold_f}F threshold."),
        )
    } else if acked {
        (
            RiskState::Watch,
            format!("User acknowledged. Monitoring high-risk condition (T_out={t_out}F)."),
        )
    } else if features.child_is_moving {
        (
            RiskState::Alert,
            format!("Child is MOVING in a stationary hot car. T_out={t_out}F."),
        )
    } else {
        (
            RiskState::Alert,
            format!(
                "Child has been STILL for {}s in a stationary hot car. T_out={t_out}F.",
                features.seconds_still
            ),
        )
    };

    RiskDecision {
        state,
        reason,
        context: features.clone(),
    }
}

/// Stage 2: decides the risk state and either ends the chain or forwards
/// to notification crafting.
#[derive(Debug, Clone, Default)]
pub struct RiskEvaluator {
    config: RiskConfig,
}

impl RiskEvaluator {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Stage for RiskEvaluator {
    fn name(&self) -> &'static str {
        StageId::RiskEvaluator.as_str()
    }

    async fn process(&self, message: Message) -> Result<Message, StageFault> {
        let (features, acked) = match message.payload {
            Payload::Features { features, acked } => (features, acked),
            other => return Err(StageFault::unexpected("features", &other)),
        };

        let decision = evaluate(&features, acked, self.config.temperature_threshold_f);

        if !decision.state.requires_escalation() {
            info!(state = %decision.state, reason = %decision.reason, "Risk evaluated, chain ends");
            return Ok(Message::forward(
                message.trace,
                StageId::RiskEvaluator,
                StageId::Orchestrator,
                Intent::FinalPlan,
                Payload::Final(FinalPlan {
                    approved: true,
                    plan: EscalationPlan::quiet(decision.state),
                    context: decision.context,
                }),
            ));
        }

        info!(
            state = %decision.state,
            seconds_unacknowledged = decision.context.seconds_unacknowledged,
            reason = %decision.reason,
            "Risk evaluated, crafting notification"
        );
        Ok(Message::forward(
            message.trace,
            StageId::RiskEvaluator,
            StageId::NotificationCrafter,
            Intent::CraftMessage,
            Payload::Decision(decision),
        ))
    }
}
