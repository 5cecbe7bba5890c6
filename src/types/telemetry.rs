//! Raw sensor telemetry and the canonical feature set derived from it

use serde::{Deserialize, Serialize};

/// Raw telemetry as posted by the in-vehicle unit: string-keyed and
/// heterogeneous (numbers may arrive as strings, fields may be missing).
pub type RawTelemetry = serde_json::Map<String, serde_json::Value>;

/// Telemetry keys understood by the normalizer.
pub mod telemetry_keys {
    pub const BUCKLE_STATE: &str = "buckle_state";
    pub const MOTION_STATE: &str = "motion_state";
    pub const OUTSIDE_TEMP_F: &str = "outside_temp_f";
    pub const SECONDS_STILL: &str = "t_still";
    pub const SECONDS_UNACKNOWLEDGED: &str = "t_unacknowledged";
    pub const GPS: &str = "gps";

    /// Buckle sensor reading that means a child is seated.
    pub const BUCKLED: &str = "BUCKLED";
    /// Motion sensor reading that means the child is moving.
    pub const MOVING: &str = "MOVING";
}

/// GPS fix of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gps {
    pub lat: f64,
    pub lon: f64,
}

impl Gps {
    /// Public map link for this fix.
    pub fn map_link(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lon)
    }
}

/// Canonical feature set produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    /// Buckle sensor reads BUCKLED
    pub present: bool,
    /// Motion sensor reads MOVING (stillness is the default)
    pub child_is_moving: bool,
    /// Outside temperature (°F)
    pub outside_temp_f: f64,
    /// Seconds since last detected motion
    pub seconds_still: f64,
    /// Caller-tracked seconds an ALERT has gone unacknowledged
    pub seconds_unacknowledged: f64,
    #[serde(default)]
    pub gps: Option<Gps>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            present: false,
            child_is_moving: false,
            outside_temp_f: crate::config::defaults::DEFAULT_OUTSIDE_TEMP_F,
            seconds_still: 0.0,
            seconds_unacknowledged: 0.0,
            gps: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_camel_case_wire_names() {
        let f = Features {
            present: true,
            child_is_moving: false,
            outside_temp_f: 92.0,
            seconds_still: 200.0,
            seconds_unacknowledged: 35.0,
            gps: Some(Gps { lat: 29.76, lon: -95.37 }),
        };
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["childIsMoving"], false);
        assert_eq!(v["outsideTempF"], 92.0);
        assert_eq!(v["secondsUnacknowledged"], 35.0);
        assert_eq!(v["gps"]["lat"], 29.76);
    }

    #[test]
    fn test_map_link() {
        let gps = Gps { lat: 34.0522, lon: -118.2437 };
        assert_eq!(gps.map_link(), "https://www.google.com/maps?q=34.0522,-118.2437");
    }
}
