//! Deep links for tapped notifications

use serde_json::Value;

/// Screen route for a tapped proximity notification.
///
/// Expects the `{"tripId": <id>}` payload attached by the dispatcher; the id
/// may arrive as a number or a numeric string. Anything else has no route.
#[must_use]
pub fn route_for_notification(data: &Value) -> Option<String> {
    let id = match data.get("tripId")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(format!("/trip/{id}"))
}
