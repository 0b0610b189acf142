//! Fence-stripping JSON extraction for strict-JSON phase replies.
//!
//! Models asked for "raw JSON, no markdown" still fence their output often
//! enough that every consumer needs the same stripping. Non-object JSON is a
//! parse failure: phase replies are always objects.

use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum raw-text preview carried in a parse error.
const RAW_PREVIEW_CHARS: usize = 500;

/// JSON extraction failure, carrying a bounded preview of the raw text.
#[derive(Debug, Error)]
pub enum JsonBlockError {
    #[error("failed to parse JSON: {raw}")]
    Invalid { raw: String },
    #[error("expected a JSON object, got {kind}: {raw}")]
    NotAnObject { kind: &'static str, raw: String },
}

fn preview(text: &str) -> String {
    text.chars().take(RAW_PREVIEW_CHARS).collect()
}

/// Strips a surrounding markdown code fence (``` or ```json) when present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    // Drop the opening fence line, then a trailing ``` line when present.
    let inner = trimmed
        .find('\n')
        .map(|i| &trimmed[i + 1..])
        .unwrap_or("")
        .trim_end();
    inner.strip_suffix("```").map(str::trim_end).unwrap_or(inner)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extracts a JSON object from model output, stripping markdown fences.
///
/// Returns the object's map on success. Invalid JSON and non-object JSON are
/// both errors; callers treat either as a phase parse failure and fall back.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, JsonBlockError> {
    let cleaned = strip_fences(text);
    let value: Value = serde_json::from_str(cleaned).map_err(|_| JsonBlockError::Invalid {
        raw: preview(cleaned),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(JsonBlockError::NotAnObject {
            kind: value_kind(&other),
            raw: preview(cleaned),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Plain JSON object parses directly.
    #[test]
    fn parses_plain_object() {
        let map = extract_json_object(r#"{"status": "valid", "is_safe": true}"#).unwrap();
        assert_eq!(map.get("status").and_then(|v| v.as_str()), Some("valid"));
    }

    /// **Scenario**: A ```json fenced object parses after stripping.
    #[test]
    fn parses_fenced_object() {
        let text = "```json\n{\"requires_live_data\": false}\n```";
        let map = extract_json_object(text).unwrap();
        assert_eq!(
            map.get("requires_live_data").and_then(|v| v.as_bool()),
            Some(false)
        );
    }

    /// **Scenario**: A fence without a closing line still parses.
    #[test]
    fn parses_fence_without_closing_line() {
        let text = "```\n{\"a\": 1}";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map.get("a").and_then(|v| v.as_i64()), Some(1));
    }

    /// **Scenario**: Free prose is an Invalid error with a bounded preview.
    #[test]
    fn prose_is_invalid_with_preview() {
        let long: String = "x".repeat(2000);
        match extract_json_object(&long) {
            Err(JsonBlockError::Invalid { raw }) => assert_eq!(raw.chars().count(), 500),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    /// **Scenario**: Top-level arrays are rejected (phase replies are objects).
    #[test]
    fn array_is_not_an_object() {
        match extract_json_object("[1, 2, 3]") {
            Err(JsonBlockError::NotAnObject { kind, .. }) => assert_eq!(kind, "array"),
            other => panic!("expected NotAnObject, got {:?}", other),
        }
    }
}
