//! Prompt text for the notification generator

use super::GenerationRequest;

/// Prefix every public post must start with.
pub const PUBLIC_ALERT_PREFIX: &str = "🚨 PUBLIC SAFETY ALERT 🚨";

/// System instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are an assistant for a child safety device. \
Your job is to create urgent, clear, and calm notifications for a parent or caregiver. \
Respond ONLY with a valid JSON object containing 'title', 'body', and 'socialPost' fields. \
All fields must be strings. Do not use markdown.";

/// Render the user prompt for one notification.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let ctx = &request.context;
    let location = ctx
        .gps
        .map(|g| format!("({}, {})", g.lat, g.lon))
        .unwrap_or_else(|| "unknown".to_string());
    let map_link = ctx.gps.map(|g| g.map_link()).unwrap_or_default();

    format!(
        r#"Generate a notification for a parent about their child's safety.

State: {state}
Reason: {reason}
Location: {location}
Map link: {map_link}
Outside Temp: {temp}°F

Create a JSON response with exactly three fields:
- "title": A short urgent headline (max 50 chars).
- "body": A clear action message (max 100 chars).
- "socialPost": A public safety alert post (max 280 chars). This post must be anonymous (no names), state the emergency (child in hot car), the temperature, and the map link. Start with "{prefix}".

Your response (JSON only, no markdown):
"#,
        state = request.state,
        reason = request.reason,
        temp = ctx.outside_temp_f,
        prefix = PUBLIC_ALERT_PREFIX,
    )
}
