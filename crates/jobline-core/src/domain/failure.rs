//! Failure inputs -> the job's `error` string.

use std::error::Error;

/// Message of a typed error (its `Display`).
pub fn message_of_error(err: &(dyn Error + '_)) -> String {
    err.to_string()
}

/// Message of an untyped failure value.
///
/// - `{"message": "..."}` yields the message
/// - a JSON string yields its contents
/// - anything else yields its JSON text
pub fn message_of_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(message)) => message.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}
