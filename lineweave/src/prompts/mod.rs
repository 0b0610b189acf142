//! Prompt catalog: named system prompts resolved from an external source.
//!
//! Each phase's system prompt is fetched by logical name from a
//! [`PromptSource`]. Resolution happens once, at agent construction, via
//! [`PromptSet::resolve`] — a missing required prompt is a loud startup
//! error, never a silent embedded default. (The phases themselves still fail
//! open at run time; only prompt availability is startup-fatal.)
//!
//! Sources: [`YamlPromptSource`] (a YAML map of name → text, the shape the
//! CLI ships) and [`StaticPromptSource`] (in-code map for tests).

mod builders;
mod source;

pub use builders::{
    build_input_validation_messages, build_planning_messages, build_react_reasoning_messages,
    build_summary_messages, build_understanding_messages, format_react_scratchpad,
    with_memory_context,
};
pub use source::{PromptSource, StaticPromptSource, YamlPromptSource};

use thiserror::Error;

/// Logical names of the required prompts.
pub const PROMPT_INPUT_VALIDATION: &str = "input-validation-system";
pub const PROMPT_UNDERSTANDING: &str = "understanding-system";
pub const PROMPT_PLANNING: &str = "planning-system";
pub const PROMPT_REACT_REASONING: &str = "react-reasoning-system";
pub const PROMPT_SYNTHESIS_DIRECT: &str = "synthesis-direct-system";
pub const PROMPT_SYNTHESIS_DATA: &str = "synthesis-data-system";
pub const PROMPT_SUMMARY: &str = "summary-system";

/// All required prompt names, in resolution order.
pub const REQUIRED_PROMPTS: &[&str] = &[
    PROMPT_INPUT_VALIDATION,
    PROMPT_UNDERSTANDING,
    PROMPT_PLANNING,
    PROMPT_REACT_REASONING,
    PROMPT_SYNTHESIS_DIRECT,
    PROMPT_SYNTHESIS_DATA,
    PROMPT_SUMMARY,
];

/// Prompt resolution errors.
#[derive(Debug, Error)]
pub enum PromptError {
    /// A required named prompt is not available from the source.
    #[error("required prompt not available: {0}")]
    Missing(String),
    /// The prompt source itself could not be read (e.g. bad YAML file).
    #[error("prompt source unreadable: {0}")]
    Source(String),
}

/// The resolved system prompts for every phase.
///
/// Owning resolved strings (rather than consulting the source per call)
/// keeps phase execution free of prompt-source failures.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub input_validation: String,
    pub understanding: String,
    pub planning: String,
    pub react_reasoning: String,
    pub synthesis_direct: String,
    pub synthesis_data: String,
    pub summary: String,
}

impl PromptSet {
    /// Resolves every required prompt from the source; fails loudly on the
    /// first missing name.
    pub fn resolve(source: &dyn PromptSource) -> Result<Self, PromptError> {
        let get = |name: &str| -> Result<String, PromptError> {
            source
                .get(name)
                .ok_or_else(|| PromptError::Missing(name.to_string()))
        };
        Ok(Self {
            input_validation: get(PROMPT_INPUT_VALIDATION)?,
            understanding: get(PROMPT_UNDERSTANDING)?,
            planning: get(PROMPT_PLANNING)?,
            react_reasoning: get(PROMPT_REACT_REASONING)?,
            synthesis_direct: get(PROMPT_SYNTHESIS_DIRECT)?,
            synthesis_data: get(PROMPT_SYNTHESIS_DATA)?,
            summary: get(PROMPT_SUMMARY)?,
        })
    }
}
