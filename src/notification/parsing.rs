//! Generator Output Parsing
//!
//! Parses the text-generation capability's output into `NotificationContent`
//! with strict validation: a JSON object whose `title`, `body` and
//! `socialPost` are non-empty strings. Values are trimmed and clamped to the
//! delivery length limits.

use serde_json::Value;

use super::clamp_chars;
use crate::llm::GenerationError;
use crate::types::{NotificationContent, BODY_MAX_CHARS, SOCIAL_POST_MAX_CHARS, TITLE_MAX_CHARS};

/// Parse raw generator text into deliverable notification content.
pub fn parse_notification(raw: &str) -> Result<NotificationContent, GenerationError> {
    let json_text = strip_code_fence(raw);
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let Value::Object(map) = value else {
        return Err(GenerationError::Malformed(
            "expected a JSON object".to_string(),
        ));
    };

    let field = |name: &'static str, max: usize| -> Result<String, GenerationError> {
        match map.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(clamp_chars(s, max)),
            _ => Err(GenerationError::MissingField(name)),
        }
    };

    Ok(NotificationContent {
        title: field("title", TITLE_MAX_CHARS)?,
        body: field("body", BODY_MAX_CHARS)?,
        social_post: field("socialPost", SOCIAL_POST_MAX_CHARS)?,
    })
}

/// Strip a surrounding markdown code fence (```json ... ```) if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
