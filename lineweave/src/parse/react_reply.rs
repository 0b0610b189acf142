//! Parser for the labelled-section ReAct grammar.
//!
//! Expected reply shape (labels case-insensitive, sections in order):
//!
//! ```text
//! Thought: <free text, may span lines>
//! Action: <tool name or "finish">
//! Action Input: <JSON object, optionally fenced>
//! ```
//!
//! Malformed output never aborts the loop: the reply degrades to
//! `action_input = {"raw": <text>}` with `parse_error` set, and the caller
//! advances. An unknown/empty action then fails naturally at the action
//! step with an observable error.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

use super::json_block::extract_json_object;

/// A parsed ReAct reasoning reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactReply {
    pub thought: String,
    /// Lowercase-trimmed action ("finish" is the terminal signal).
    pub action: String,
    pub action_input: Value,
    /// Set when the reply did not follow the grammar; the loop still advances.
    pub parse_error: Option<String>,
}

fn section_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)thought\s*:\s*(?P<thought>.*?)\s*action\s*:\s*(?P<action>[^\n]*)(?:\s*action\s+input\s*:\s*(?P<input>.*))?$",
        )
        .expect("react grammar regex compiles")
    })
}

/// Parses one reasoning reply against the documented grammar.
///
/// Degradations (all leave `parse_error` set):
/// - no `Action:` label → empty action, `{"raw": <text>}` input;
/// - `Action Input:` present but not valid JSON → the parsed action is kept,
///   input becomes `{"raw": <input text>}`.
///
/// A missing `Action Input:` section alone is not an error; tools without
/// arguments are called with `{}`.
pub fn parse_react_reply(text: &str) -> ReactReply {
    let trimmed = text.trim();

    let Some(caps) = section_regex().captures(trimmed) else {
        return ReactReply {
            thought: trimmed.to_string(),
            action: String::new(),
            action_input: json!({ "raw": trimmed }),
            parse_error: Some("missing Thought/Action sections".to_string()),
        };
    };

    let thought = caps
        .name("thought")
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let action = caps
        .name("action")
        .map(|m| m.as_str().trim().to_lowercase())
        .unwrap_or_default();

    match caps.name("input") {
        None => ReactReply {
            thought,
            action,
            action_input: json!({}),
            parse_error: None,
        },
        Some(input) => {
            let input_text = input.as_str().trim();
            if input_text.is_empty() {
                return ReactReply {
                    thought,
                    action,
                    action_input: json!({}),
                    parse_error: None,
                };
            }
            match extract_json_object(input_text) {
                Ok(map) => ReactReply {
                    thought,
                    action,
                    action_input: Value::Object(map),
                    parse_error: None,
                },
                Err(_) => ReactReply {
                    thought,
                    action,
                    action_input: json!({ "raw": input_text }),
                    parse_error: Some("Action Input is not a JSON object".to_string()),
                },
            }
        }
    }
}
