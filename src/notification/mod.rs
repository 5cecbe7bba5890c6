//! Notification content handling
//!
//! - `parsing`: validate and clamp generator output into `NotificationContent`
//! - `templates`: deterministic fallback content when generation fails

pub mod parsing;
pub mod templates;

pub use parsing::parse_notification;
pub use templates::fallback_notification;

/// Truncate to at most `max` characters after trimming surrounding whitespace.
pub fn clamp_chars(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        trimmed.to_string()
    } else {
        trimmed.chars().take(max).collect::<String>().trim_end().to_string()
    }
}
