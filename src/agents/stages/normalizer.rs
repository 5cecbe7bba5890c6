//! Normalizer - raw telemetry to canonical features
//!
//! Pure field mapping with explicit defaults. Numbers may arrive as JSON
//! numbers or numeric strings; anything unreadable falls back to the
//! field default with a warning instead of failing the hop.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::Stage;
use crate::agents::StageFault;
use crate::config::NormalizerConfig;
use crate::types::telemetry_keys as keys;
use crate::types::{Features, Gps, Intent, Message, Payload, RawTelemetry, StageId};

/// Stage 1: maps raw telemetry onto `Features`.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Derive features from one telemetry reading.
    pub fn normalize(&self, telemetry: &RawTelemetry) -> Features {
        Features {
            present: reads(telemetry, keys::BUCKLE_STATE, keys::BUCKLED),
            child_is_moving: reads(telemetry, keys::MOTION_STATE, keys::MOVING),
            outside_temp_f: number(telemetry, keys::OUTSIDE_TEMP_F)
                .unwrap_or(self.config.default_outside_temp_f),
            seconds_still: duration(telemetry, keys::SECONDS_STILL),
            seconds_unacknowledged: duration(telemetry, keys::SECONDS_UNACKNOWLEDGED),
            gps: gps(telemetry),
        }
    }
}

#[async_trait]
impl Stage for Normalizer {
    fn name(&self) -> &'static str {
        StageId::Normalizer.as_str()
    }

    async fn process(&self, message: Message) -> Result<Message, StageFault> {
        let (telemetry, acked) = match message.payload {
            Payload::Telemetry { telemetry, acked } => (telemetry, acked),
            other => return Err(StageFault::unexpected("telemetry", &other)),
        };

        let features = self.normalize(&telemetry);

        Ok(Message::forward(
            message.trace,
            StageId::Normalizer,
            StageId::RiskEvaluator,
            Intent::EvaluateRisk,
            Payload::Features { features, acked },
        ))
    }
}

fn reads(telemetry: &RawTelemetry, key: &str, expected: &str) -> bool {
    telemetry.get(key).and_then(Value::as_str) == Some(expected)
}

/// Read a finite number; `None` when the key is absent or null.
fn number(telemetry: &RawTelemetry, key: &str) -> Option<f64> {
    let value = telemetry.get(key)?;
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Some(v),
        _ => {
            warn!(field = key, value = %value, "Unreadable telemetry value, using default");
            None
        }
    }
}

/// Elapsed-seconds fields: default 0, never negative.
fn duration(telemetry: &RawTelemetry, key: &str) -> f64 {
    number(telemetry, key).unwrap_or(0.0).max(0.0)
}

fn gps(telemetry: &RawTelemetry) -> Option<Gps> {
    let value = telemetry.get(keys::GPS)?;
    if value.is_null() {
        return None;
    }
    let coord = |name: &str| match value.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match (coord("lat"), coord("lon")) {
        (Some(lat), Some(lon))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
        {
            Some(Gps { lat, lon })
        }
        _ => {
            warn!(value = %value, "Ignoring malformed GPS fix");
            None
        }
    }
}
