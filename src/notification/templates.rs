//! Deterministic fallback notifications
//!
//! Used whenever the text-generation capability is unavailable, times out,
//! or returns something that fails validation. Output always satisfies the
//! three-field contract and the length limits, so the escalation ladder
//! never runs without content.

use super::clamp_chars;
use crate::llm::prompt::PUBLIC_ALERT_PREFIX;
use crate::types::{
    Features, NotificationContent, RiskState, BODY_MAX_CHARS, SOCIAL_POST_MAX_CHARS,
    TITLE_MAX_CHARS,
};

/// Build the fallback notification for a risk decision.
///
/// GPS-derived text only appears as a map link, which the compliance
/// filter leaves untouched.
pub fn fallback_notification(
    state: RiskState,
    reason: &str,
    context: &Features,
) -> NotificationContent {
    let temp = context.outside_temp_f;
    let link = context.gps.map(|g| g.map_link());

    let title = format!("{state} Alert");

    let reason = reason.trim().trim_end_matches('.');
    let reason = if reason.is_empty() { "Check on your child now" } else { reason };
    let location = link.as_deref().unwrap_or("unknown");
    let body = format!("{reason}. Location: {location}. Temperature: {temp}°F.");

    let social_post = match (context.gps, link.as_deref()) {
        (Some(gps), Some(link)) => format!(
            "{PUBLIC_ALERT_PREFIX} Child locked in hot car at ({}, {}). Temp: {temp}°F. \
             Last seen at {link}. Authorities have been notified.",
            gps.lat, gps.lon
        ),
        _ => format!(
            "{PUBLIC_ALERT_PREFIX} Child locked in hot car. Temp: {temp}°F. \
             Location unavailable. Authorities have been notified."
        ),
    };

    NotificationContent {
        title: clamp_chars(&title, TITLE_MAX_CHARS),
        body: clamp_chars(&body, BODY_MAX_CHARS),
        social_post: clamp_chars(&social_post, SOCIAL_POST_MAX_CHARS),
    }
}
