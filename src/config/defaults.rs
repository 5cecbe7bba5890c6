//! System-wide default constants.
//!
//! Centralises values that seed `SafetyConfig` defaults and the simulation
//! driver. Grouped by subsystem for easy discovery.

// ============================================================================
// Normalizer
// ============================================================================

/// Outside temperature assumed when the sensor reports nothing (°F).
pub const DEFAULT_OUTSIDE_TEMP_F: f64 = 70.0;

// ============================================================================
// Risk Evaluator
// ============================================================================

/// Outside temperature at or above which a present child is at risk (°F).
pub const TEMPERATURE_THRESHOLD_F: f64 = 85.0;

// ============================================================================
// Escalation Planner
// ============================================================================

/// Unacknowledged seconds before the public tier fires (production).
pub const SOCIAL_THRESHOLD_SECS: f64 = 300.0;

/// Unacknowledged seconds before the public tier fires in rapid-response
/// demonstrations.
pub const RAPID_RESPONSE_SOCIAL_THRESHOLD_SECS: f64 = 30.0;

/// Delivery timeout for the caregiver tiers (seconds).
pub const CAREGIVER_TIER_TIMEOUT_SECS: u64 = 120;

pub const PRIMARY_CAREGIVER_TARGET: &str = "primary_caregiver";
pub const SECONDARY_CAREGIVER_TARGET: &str = "secondary_caregiver";
pub const PUBLIC_ALERT_HANDLE: &str = "@SafeTrackAlerts";

// ============================================================================
// Notification Generator
// ============================================================================

/// Bounded wait on the text-generation capability (milliseconds).
pub const GENERATOR_TIMEOUT_MS: u64 = 3_000;

/// Environment variable holding the generator API key.
pub const GENERATOR_API_KEY_ENV: &str = "AI_STUDIO_API_KEY";

pub const GENERATOR_MODEL: &str = "gemini-1.5-flash-latest";

pub const GENERATOR_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

// ============================================================================
// Simulation
// ============================================================================

/// Interval between simulated telemetry ticks (seconds).
pub const SIMULATION_TICK_SECS: f64 = 5.0;

/// Starting cabin-adjacent outside temperature for the simulation (°F).
pub const SIMULATION_START_TEMP_F: f64 = 80.0;

/// Temperature rise per tick (°F).
pub const SIMULATION_TEMP_STEP_F: f64 = 0.5;

/// Temperature cap (°F).
pub const SIMULATION_MAX_TEMP_F: f64 = 95.0;
