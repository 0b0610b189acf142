//! Structured-response extractors for free-text model output.
//!
//! Two grammars, each independently unit-testable:
//!
//! - [`json_block`]: strict-JSON phase replies that may arrive wrapped in
//!   markdown code fences.
//! - [`react_reply`]: the labelled-section ReAct grammar
//!   (`Thought:` / `Action:` / `Action Input:`) with an explicit
//!   parse-error marker instead of an abort.

mod json_block;
mod react_reply;

pub use json_block::{extract_json_object, JsonBlockError};
pub use react_reply::{parse_react_reply, ReactReply};
