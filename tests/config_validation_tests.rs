//! Config Validation Tests
//!
//! Typo detection, range validation and file loading for `safetrack.toml`,
//! exercised independently from the rest of the pipeline.

use safetrack::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use safetrack::config::{ConfigError, GeneratorProvider, SafetyConfig};
use std::io::Write;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_risk_threshold_warns_with_suggestion() {
    let toml_str = r#"
[risk]
temperature_treshold_f = 90.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("temperature_treshold_f"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("risk.temperature_threshold_f")
    );
}

#[test]
fn typo_in_nested_tier_table_warns() {
    let toml_str = r#"
[escalation.push]
targte = "mom"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("escalation.push.target")
    );
}

#[test]
fn unknown_section_has_no_close_suggestion() {
    let warnings = validate_unknown_keys("[telemetry_bus]\nenabled = true\n");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[server]
addr = "127.0.0.1:9000"

[normalizer]
default_outside_temp_f = 70.0

[risk]
temperature_threshold_f = 85.0

[escalation]
social_threshold_secs = 300.0

[escalation.push]
target = "primary_caregiver"
timeout_secs = 120

[escalation.sms]
target = "secondary_caregiver"
timeout_secs = 120

[escalation.social]
handle = "@SafeTrackAlerts"
timeout_secs = 0

[generator]
provider = "gemini"
model = "gemini-1.5-flash-latest"
timeout_ms = 3000
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn unparseable_toml_yields_no_key_warnings() {
    assert!(validate_unknown_keys("[risk\nthreshold =").is_empty());
}

#[test]
fn every_known_key_is_dotted_from_a_known_section() {
    let known = known_config_keys();
    for key in &known {
        if let Some((section, _)) = key.rsplit_once('.') {
            assert!(known.contains(section), "{key} has unknown parent {section}");
        }
    }
}

#[test]
fn suggestion_requires_small_edit_distance() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("generator.modle", &known).as_deref(),
        Some("generator.model")
    );
    assert_eq!(suggest_correction("completely.unrelated.key", &known), None);
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_is_clean() {
    let (errors, warnings) = validate_physical_ranges(&SafetyConfig::default());
    assert!(errors.is_empty());
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn impossible_temperature_threshold_is_an_error() {
    let mut config = SafetyConfig::default();
    config.risk.temperature_threshold_f = 400.0;
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("risk.temperature_threshold_f"));
    assert!(config.validate().is_err());
}

#[test]
fn rapid_response_threshold_only_warns() {
    let mut config = SafetyConfig::default();
    config.escalation.social_threshold_secs = 30.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings
        .iter()
        .any(|w| w.field == "escalation.social_threshold_secs"));
    assert!(config.validate().is_ok());
}

#[test]
fn default_temperature_above_gate_warns() {
    let mut config = SafetyConfig::default();
    config.normalizer.default_outside_temp_f = 90.0;
    let (_, warnings) = validate_physical_ranges(&config);
    assert!(warnings
        .iter()
        .any(|w| w.field == "normalizer.default_outside_temp_f"));
}

#[test]
fn negative_social_threshold_fails_validation() {
    let mut config = SafetyConfig::default();
    config.escalation.social_threshold_secs = -1.0;
    match config.validate() {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors
                .iter()
                .any(|e| e.contains("escalation.social_threshold_secs")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn empty_targets_and_zero_generator_wait_fail_together() {
    let mut config = SafetyConfig::default();
    config.escalation.push.target = "  ".to_string();
    config.escalation.social.handle = String::new();
    config.generator.timeout_ms = 0;
    let Err(ConfigError::Validation(errors)) = config.validate() else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 3, "{errors:?}");
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn partial_file_keeps_defaults_for_missing_sections() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[escalation]\nsocial_threshold_secs = 30.0\n\n[generator]\nprovider = \"disabled\""
    )
    .unwrap();

    let config = SafetyConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.escalation.social_threshold_secs, 30.0);
    assert_eq!(config.generator.provider, GeneratorProvider::Disabled);
    assert_eq!(config.risk.temperature_threshold_f, 85.0);
    assert_eq!(config.escalation.push.timeout_secs, 120);
}

#[test]
fn typos_do_not_break_loading() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[risk]\ntemperature_threshold_f = 88.0\ntemprature = 1").unwrap();

    let config = SafetyConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.risk.temperature_threshold_f, 88.0);
}

#[test]
fn malformed_file_reports_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[risk]\ntemperature_threshold_f = \"hot\"").unwrap();

    match SafetyConfig::load_from_file(file.path()) {
        Err(ConfigError::Parse(path, _)) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        SafetyConfig::load_from_file(&path),
        Err(ConfigError::Io(_, _))
    ));
}

#[test]
fn serialized_defaults_load_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("safetrack.toml");
    std::fs::write(&path, SafetyConfig::default().to_toml().unwrap()).unwrap();

    let loaded = SafetyConfig::load_from_file(&path).unwrap();
    assert!(validate_unknown_keys(&std::fs::read_to_string(&path).unwrap()).is_empty());
    assert_eq!(loaded.escalation.social.handle, "@SafeTrackAlerts");
    assert_eq!(loaded.generator.api_key_env, "AI_STUDIO_API_KEY");
}
