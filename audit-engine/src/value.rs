//! Value-to-string conversion policy.
//!
//! Used both for rendering evaluated expression results into message text
//! and for the optional before/after values carried on a record. Textual
//! values pass through verbatim, primitive-like values use their natural
//! form, and anything structured falls back to JSON.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Render an evaluated scope value as literal message/arg text.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // numbers and bools via Display; objects and arrays as JSON text
        other => other.to_string(),
    }
}

/// Convert an old/new value into its stored string form.
///
/// Returns `None` both for absent values (JSON null) and when the value
/// cannot be serialized; the latter is reported as a warning and the field
/// is simply left unset.
pub fn serialize_field<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value) {
        Ok(Value::Null) => None,
        Ok(Value::String(s)) => Some(s),
        Ok(Value::Number(n)) => Some(n.to_string()),
        Ok(Value::Bool(b)) => Some(b.to_string()),
        Ok(other) => Some(other.to_string()),
        Err(e) => {
            warn!(target: "audit", error = %e, "Cannot serialize audit value");
            None
        }
    }
}
