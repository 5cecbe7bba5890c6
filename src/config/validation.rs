//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for SafetyConfig.
///
/// Maintained manually to match the struct hierarchy in safety_config.rs.
/// Any new field added to SafetyConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        // [normalizer]
        "normalizer",
        "normalizer.default_outside_temp_f",
        // [risk]
        "risk",
        "risk.temperature_threshold_f",
        // [escalation]
        "escalation",
        "escalation.social_threshold_secs",
        "escalation.push",
        "escalation.push.target",
        "escalation.push.timeout_secs",
        "escalation.sms",
        "escalation.sms.target",
        "escalation.sms.timeout_secs",
        "escalation.social",
        "escalation.social.handle",
        "escalation.social.timeout_secs",
        // [generator]
        "generator",
        "generator.provider",
        "generator.model",
        "generator.endpoint",
        "generator.api_key_env",
        "generator.timeout_ms",
        "generator.temperature",
        "generator.max_output_tokens",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();

    let mut best: Option<(&str, usize)> = None;
    for k in candidates {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((k, dist)),
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns. Existing configs
/// always continue to work.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let found = walk_toml_keys(&value, "");
    let mut warnings = Vec::new();

    for key in &found {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key.clone(),
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed SafetyConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::SafetyConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Outdoor air temperatures on Earth stay within roughly -90..135 °F
    let threshold = config.risk.temperature_threshold_f;
    if threshold.is_finite() && !(-90.0..=135.0).contains(&threshold) {
        errors.push(format!(
            "risk.temperature_threshold_f = {threshold:.1} is outside physical range (-90-135 °F)"
        ));
    }
    let default_temp = config.normalizer.default_outside_temp_f;
    if default_temp.is_finite() && !(-90.0..=135.0).contains(&default_temp) {
        errors.push(format!(
            "normalizer.default_outside_temp_f = {default_temp:.1} is outside physical range (-90-135 °F)"
        ));
    }

    // A default reading at or above the gate would alert on silent sensors
    if default_temp.is_finite() && threshold.is_finite() && default_temp >= threshold {
        warnings.push(ValidationWarning {
            field: "normalizer.default_outside_temp_f".to_string(),
            message: format!(
                "default_outside_temp_f = {default_temp:.1} is at or above the risk threshold ({threshold:.1}); missing temperature readings will raise alerts"
            ),
            suggestion: None,
        });
    }

    // Rapid-response values belong in demonstrations, not production
    let social = config.escalation.social_threshold_secs;
    if social.is_finite() && social < 60.0 {
        warnings.push(ValidationWarning {
            field: "escalation.social_threshold_secs".to_string(),
            message: format!(
                "social_threshold_secs = {social:.0} is a rapid-response value; public alerts will fire within a minute"
            ),
            suggestion: None,
        });
    }

    // Caregiver tiers with no wait give nobody time to acknowledge
    for (name, tier) in [
        ("escalation.push.timeout_secs", &config.escalation.push),
        ("escalation.sms.timeout_secs", &config.escalation.sms),
    ] {
        if tier.timeout_secs == 0 {
            warnings.push(ValidationWarning {
                field: name.to_string(),
                message: format!("{name} = 0 leaves no time for acknowledgment"),
                suggestion: None,
            });
        }
    }

    // Generation waits beyond 30 s stall the whole pipeline
    if config.generator.timeout_ms > 30_000 {
        warnings.push(ValidationWarning {
            field: "generator.timeout_ms".to_string(),
            message: format!(
                "generator.timeout_ms = {} exceeds 30 s; every ALERT waits this long when the backend hangs",
                config.generator.timeout_ms
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SafetyConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("thresold", "threshold"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [escalation]
            social_threshold_secs = 30.0
            [escalation.push]
            target = "mom"
        "#
        .parse()
        .unwrap();
        let mut keys = walk_toml_keys(&toml, "");
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "escalation",
                "escalation.push",
                "escalation.push.target",
                "escalation.social_threshold_secs",
            ]
        );
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
[risk]
temperature_treshold_f = 90.0
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "risk.temperature_treshold_f");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("risk.temperature_threshold_f")
        );
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let warnings = validate_unknown_keys(
            r#"
[dashboard]
theme = "dark"
"#,
        );
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.field.starts_with("dashboard")));
    }

    #[test]
    fn test_serialized_defaults_have_no_unknown_keys() {
        let text = SafetyConfig::default().to_toml().unwrap();
        assert!(validate_unknown_keys(&text).is_empty());
    }

    #[test]
    fn test_physical_range_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&SafetyConfig::default());
        assert!(errors.is_empty());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_physical_range_threshold_out_of_range() {
        let mut config = SafetyConfig::default();
        config.risk.temperature_threshold_f = 400.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("temperature_threshold_f"));
    }

    #[test]
    fn test_rapid_response_threshold_warns() {
        let mut config = SafetyConfig::default();
        config.escalation.social_threshold_secs = 30.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings
            .iter()
            .any(|w| w.field == "escalation.social_threshold_secs"));
    }
}
