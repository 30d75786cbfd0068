//! Raw-JSON helpers for object fields.

use serde_json::Value;

/// Parse raw JSON text, returning the parse error as a plain message for
/// the field's error slot.
pub fn validate_json(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {e}"))
}

/// Pretty-print raw JSON text.
pub fn format_json(text: &str) -> Result<String, String> {
    let value = validate_json(text)?;
    serde_json::to_string_pretty(&value).map_err(|e| e.to_string())
}
