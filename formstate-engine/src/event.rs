use serde_json::Value;

/// Default value extractor for collected events.
///
/// An event-shaped first argument (`{"target": {...}}`) yields its target's
/// `checked` state for checkboxes and its `value` otherwise. Anything else is
/// taken as the value itself.
pub fn value_from_event(args: &[Value]) -> Value {
    let Some(first) = args.first() else {
        return Value::Null;
    };
    let Some(target) = first.get("target").filter(|t| t.is_object()) else {
        return first.clone();
    };
    let prop = if target.get("type").and_then(Value::as_str) == Some("checkbox") {
        "checked"
    } else {
        "value"
    };
    target.get(prop).cloned().unwrap_or(Value::Null)
}
