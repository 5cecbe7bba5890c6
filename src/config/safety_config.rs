//! Safety Configuration - escalation thresholds as operator-tunable TOML values
//!
//! Every threshold the pipeline uses is a field in this module. Each struct
//! implements `Default` with the reference values, so a missing config file
//! yields working behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SAFETRACK_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "safetrack.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a SafeTrack deployment.
///
/// Load with `SafetyConfig::load()` which searches:
/// 1. `$SAFETRACK_CONFIG` env var
/// 2. `./safetrack.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SafetyConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Telemetry defaults applied by the normalizer
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// Risk evaluator gates
    #[serde(default)]
    pub risk: RiskConfig,

    /// Escalation ladder tiers and gates
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// External text-generation capability
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl SafetyConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SAFETRACK_CONFIG` environment variable
    /// 2. `./safetrack.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded safety config from SAFETRACK_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SAFETRACK_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SAFETRACK_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./safetrack.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded safety config from ./safetrack.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./safetrack.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No safetrack.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are warnings only.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let typo_warnings = super::validation::validate_unknown_keys(contents);
        for w in &typo_warnings {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all thresholds for internal consistency.
    ///
    /// Rules:
    /// - All numeric thresholds must be finite
    /// - Time gates must be non-negative
    /// - Caregiver targets and the public handle must be non-empty
    /// - The generator wait must be bounded and non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if !self.risk.temperature_threshold_f.is_finite() {
            errors.push(format!(
                "risk.temperature_threshold_f must be finite (got {})",
                self.risk.temperature_threshold_f
            ));
        }
        if !self.normalizer.default_outside_temp_f.is_finite() {
            errors.push(format!(
                "normalizer.default_outside_temp_f must be finite (got {})",
                self.normalizer.default_outside_temp_f
            ));
        }

        let e = &self.escalation;
        if !e.social_threshold_secs.is_finite() || e.social_threshold_secs < 0.0 {
            errors.push(format!(
                "escalation.social_threshold_secs must be a finite value >= 0 (got {})",
                e.social_threshold_secs
            ));
        }
        Self::check_target(&e.push.target, "escalation.push.target", &mut errors);
        Self::check_target(&e.sms.target, "escalation.sms.target", &mut errors);
        Self::check_target(&e.social.handle, "escalation.social.handle", &mut errors);

        let g = &self.generator;
        if g.timeout_ms == 0 {
            errors.push("generator.timeout_ms must be > 0".to_string());
        }
        if !(0.0..=2.0).contains(&g.temperature) {
            errors.push(format!(
                "generator.temperature must be within 0.0-2.0 (got {})",
                g.temperature
            ));
        }
        if g.max_output_tokens == 0 {
            errors.push("generator.max_output_tokens must be > 0".to_string());
        }
        if g.provider == GeneratorProvider::Gemini && g.model.trim().is_empty() {
            errors.push("generator.model must be set for the gemini provider".to_string());
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_target(value: &str, name: &str, errors: &mut Vec<String>) {
        if value.trim().is_empty() {
            errors.push(format!("{name} must not be empty"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Server
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `SAFETRACK_SERVER_ADDR`, `PORT`, or `--addr`.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Defaults the normalizer applies to missing telemetry fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Outside temperature assumed when the sensor is silent (°F).
    #[serde(default = "default_outside_temp")]
    pub default_outside_temp_f: f64,
}

fn default_outside_temp() -> f64 { defaults::DEFAULT_OUTSIDE_TEMP_F }

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_outside_temp_f: default_outside_temp(),
        }
    }
}

// ============================================================================
// Risk Evaluator
// ============================================================================

/// Risk evaluator gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Outside temperatures below this are SAFE regardless of anything else (°F).
    #[serde(default = "default_temperature_threshold")]
    pub temperature_threshold_f: f64,
}

fn default_temperature_threshold() -> f64 { defaults::TEMPERATURE_THRESHOLD_F }

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            temperature_threshold_f: default_temperature_threshold(),
        }
    }
}

// ============================================================================
// Escalation Planner
// ============================================================================

/// Escalation ladder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Unacknowledged seconds at or above which the public tier fires.
    ///
    /// Rapid-response demonstrations use 30; production deployments should
    /// keep a materially larger value.
    #[serde(default = "default_social_threshold")]
    pub social_threshold_secs: f64,

    /// Tier 1: app push to the primary caregiver
    #[serde(default = "default_push_tier")]
    pub push: CaregiverTierConfig,

    /// Tier 2: SMS to the secondary caregiver
    #[serde(default = "default_sms_tier")]
    pub sms: CaregiverTierConfig,

    /// Tier 3: public alert
    #[serde(default)]
    pub social: PublicTierConfig,
}

fn default_social_threshold() -> f64 { defaults::SOCIAL_THRESHOLD_SECS }

fn default_push_tier() -> CaregiverTierConfig {
    CaregiverTierConfig {
        target: defaults::PRIMARY_CAREGIVER_TARGET.to_string(),
        timeout_secs: defaults::CAREGIVER_TIER_TIMEOUT_SECS,
    }
}

fn default_sms_tier() -> CaregiverTierConfig {
    CaregiverTierConfig {
        target: defaults::SECONDARY_CAREGIVER_TARGET.to_string(),
        timeout_secs: defaults::CAREGIVER_TIER_TIMEOUT_SECS,
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            social_threshold_secs: default_social_threshold(),
            push: default_push_tier(),
            sms: default_sms_tier(),
            social: PublicTierConfig::default(),
        }
    }
}

/// A caregiver delivery tier (push or SMS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaregiverTierConfig {
    /// Recipient identifier handed to the delivery channel.
    pub target: String,

    /// Seconds to wait for acknowledgment before the next tier.
    #[serde(default = "default_caregiver_timeout")]
    pub timeout_secs: u64,
}

fn default_caregiver_timeout() -> u64 { defaults::CAREGIVER_TIER_TIMEOUT_SECS }

/// The public-alert tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTierConfig {
    /// Public account the alert is posted from.
    #[serde(default = "default_public_handle")]
    pub handle: String,

    /// Delivery timeout; public posts are fire-and-forget.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_public_handle() -> String { defaults::PUBLIC_ALERT_HANDLE.to_string() }

impl Default for PublicTierConfig {
    fn default() -> Self {
        Self {
            handle: default_public_handle(),
            timeout_secs: 0,
        }
    }
}

// ============================================================================
// Notification Generator
// ============================================================================

/// Which text-generation backend the notification crafter calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    /// Google AI Studio `generateContent` REST endpoint
    #[default]
    Gemini,
    /// No backend; every call falls back to the deterministic template
    Disabled,
}

/// External text-generation capability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub provider: GeneratorProvider,

    #[serde(default = "default_generator_model")]
    pub model: String,

    /// Base URL of the generation API.
    #[serde(default = "default_generator_endpoint")]
    pub endpoint: String,

    /// Environment variable the API key is read from.
    #[serde(default = "default_generator_key_env")]
    pub api_key_env: String,

    /// Bounded wait on a single generation call (ms). Timeout means fallback.
    #[serde(default = "default_generator_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_generator_temperature")]
    pub temperature: f64,

    #[serde(default = "default_generator_max_tokens")]
    pub max_output_tokens: u32,
}

fn default_generator_model() -> String { defaults::GENERATOR_MODEL.to_string() }
fn default_generator_endpoint() -> String { defaults::GENERATOR_ENDPOINT.to_string() }
fn default_generator_key_env() -> String { defaults::GENERATOR_API_KEY_ENV.to_string() }
fn default_generator_timeout() -> u64 { defaults::GENERATOR_TIMEOUT_MS }
fn default_generator_temperature() -> f64 { 0.2 }
fn default_generator_max_tokens() -> u32 { 2048 }

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::default(),
            model: default_generator_model(),
            endpoint: default_generator_endpoint(),
            api_key_env: default_generator_key_env(),
            timeout_ms: default_generator_timeout(),
            temperature: default_generator_temperature(),
            max_output_tokens: default_generator_max_tokens(),
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}
