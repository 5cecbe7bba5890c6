//! Orchestrator - drives one envelope through the five stages
//!
//! The orchestrator is the only component that knows the chain order. It
//! seeds the trace with `Client/START`, hands each stage's output envelope
//! to the next stage, and stops at the first of:
//!
//! - an Error envelope (surfaced to the caller, no further stage runs)
//! - a FINAL_PLAN message (SAFE/WATCH short-circuit or compliance approval)
//!
//! A run that passes every stage without reaching a final plan is a
//! processing fault attributed to the last stage.
//!
//! Runs hold no state beyond their own envelope, so one `Orchestrator`
//! behind an `Arc` serves concurrent callers.

use std::sync::Arc;
use tracing::{info, warn};

use super::stages::{default_stages, Stage};
use crate::config::SafetyConfig;
use crate::llm::NotificationGenerator;
use crate::types::{
    EscalationPlan, Envelope, ErrorCode, Features, FinalPlan, Message, Payload, RawTelemetry,
    StageError, TraceEntry,
};

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Approved plan (empty steps for SAFE / WATCH)
    pub plan: EscalationPlan,
    pub approved: bool,
    /// Feature set the plan was built from
    pub context: Features,
    /// Final trace: `Client/START` followed by one entry per stage hop
    pub trace: Vec<TraceEntry>,
    /// Every envelope in order, starting with the seed message
    pub hops: Vec<Envelope>,
}

/// Orchestrator for the fixed five-stage chain
pub struct Orchestrator {
    /// Stages in chain order
    stages: Vec<Box<dyn Stage>>,
}

impl Orchestrator {
    /// Build the standard chain from configuration and an injected generator.
    pub fn new(config: &SafetyConfig, generator: Arc<dyn NotificationGenerator>) -> Self {
        Self::with_stages(default_stages(config, generator))
    }

    /// Build a chain from explicit stages (test doubles, alternate policies).
    pub fn with_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Look up a stage by name for direct invocation.
    pub fn stage(&self, name: &str) -> Option<&dyn Stage> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Stage names in chain order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run one telemetry reading through the chain.
    pub async fn run(&self, telemetry: RawTelemetry, acked: bool) -> Result<PipelineRun, StageError> {
        let seed = Message::start(telemetry, acked);
        let mut hops: Vec<Envelope> = vec![Envelope::Message(seed.clone())];
        let mut current = Envelope::Message(seed);

        for stage in &self.stages {
            current = stage.handle(current).await;
            hops.push(current.clone());

            match &current {
                Envelope::Error(err) => {
                    warn!(
                        stage = %err.stage,
                        code = %err.code,
                        detail = %err.detail,
                        "Pipeline halted"
                    );
                    return Err(err.clone());
                }
                Envelope::Message(Message {
                    payload: Payload::Final(fin),
                    trace,
                    ..
                }) => {
                    return Ok(Self::finish(fin.clone(), trace.clone(), hops));
                }
                Envelope::Message(_) => {}
            }
        }

        let last = self.stages.last().map_or("ORCHESTRATOR", |s| s.name());
        Err(StageError::new(
            last,
            ErrorCode::ProcessFailed,
            "chain ended without a final plan",
        ))
    }

    fn finish(fin: FinalPlan, trace: Vec<TraceEntry>, hops: Vec<Envelope>) -> PipelineRun {
        info!(
            state = %fin.plan.state,
            steps = fin.plan.steps.len(),
            hops = trace.len(),
            "Pipeline complete"
        );
        PipelineRun {
            plan: fin.plan,
            approved: fin.approved,
            context: fin.context,
            trace,
            hops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::StageFault;
    use crate::llm::DisabledGenerator;
    use crate::types::RiskState;
    use async_trait::async_trait;
    use serde_json::json;

    fn telemetry(value: serde_json::Value) -> RawTelemetry {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("telemetry must be an object"),
        }
    }

    fn orchestrator() -> Orchestrator {
        let mut config = SafetyConfig::default();
        config.escalation.social_threshold_secs = 30.0;
        Orchestrator::new(&config, Arc::new(DisabledGenerator::new("test")))
    }

    #[tokio::test]
    async fn test_full_run_trace() {
        let run = orchestrator()
            .run(
                telemetry(json!({
                    "buckle_state": "BUCKLED",
                    "motion_state": "STILL",
                    "outside_temp_f": 92,
                    "t_still": 200,
                    "t_unacknowledged": 35
                })),
                false,
            )
            .await
            .unwrap();
        assert_eq!(run.plan.state, RiskState::Alert);
        assert!(run.approved);
        assert_eq!(run.plan.tiers(), vec![1, 2, 3]);

        let stages: Vec<_> = run.trace.iter().map(|t| t.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec!["Client", "Normalizer", "RiskEvaluator", "NotificationCrafter", "EscalationPlanner", "ComplianceFilter"]
        );
        assert_eq!(run.hops.len(), 6);
    }

    #[tokio::test]
    async fn test_short_circuit_trace() {
        let run = orchestrator()
            .run(telemetry(json!({ "buckle_state": "UNBUCKLED" })), false)
            .await
            .unwrap();
        assert_eq!(run.plan.state, RiskState::Safe);
        assert!(run.plan.steps.is_empty());
        assert_eq!(run.trace.len(), 3);
        assert_eq!(run.hops.len(), 3);
    }

    struct Exploding;

    #[async_trait]
    impl Stage for Exploding {
        fn name(&self) -> &'static str {
            "Exploding"
        }

        async fn process(&self, _message: Message) -> Result<Message, StageFault> {
            Err(StageFault::Failed("kaboom".to_string()))
        }
    }

    struct NeverCalled;

    #[async_trait]
    impl Stage for NeverCalled {
        fn name(&self) -> &'static str {
            "NeverCalled"
        }

        async fn process(&self, _message: Message) -> Result<Message, StageFault> {
            panic!("downstream stage must not run after an error")
        }
    }

    #[tokio::test]
    async fn test_error_halts_chain() {
        let orchestrator = Orchestrator::with_stages(vec![Box::new(Exploding), Box::new(NeverCalled)]);
        let err = orchestrator.run(RawTelemetry::new(), false).await.unwrap_err();
        assert_eq!(err.stage, "Exploding");
        assert_eq!(err.code, ErrorCode::ProcessFailed);
        assert_eq!(err.detail, "kaboom");
    }

    #[tokio::test]
    async fn test_chain_without_final_plan_fails() {
        let orchestrator = Orchestrator::with_stages(vec![Box::new(crate::agents::Normalizer::default())]);
        let err = orchestrator.run(RawTelemetry::new(), false).await.unwrap_err();
        assert_eq!(err.stage, "Normalizer");
        assert_eq!(err.code, ErrorCode::ProcessFailed);
    }

    #[test]
    fn test_stage_lookup() {
        let o = orchestrator();
        assert!(o.stage("RiskEvaluator").is_some());
        assert!(o.stage("SensingAgent").is_none());
        assert_eq!(o.stage_names().len(), 5);
    }
}
