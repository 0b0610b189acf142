//! Token-limit parameter resolution per model family.
//!
//! Newer model families reject `max_tokens` and require
//! `max_completion_tokens`; which one applies is resolved from a static
//! table keyed by model-name substring.

/// Which request parameter carries the completion token limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimitParam {
    MaxTokens,
    MaxCompletionTokens,
}

/// Model-name substrings whose families require `max_completion_tokens`.
const MAX_COMPLETION_TOKEN_FAMILIES: &[&str] = &["o1", "o3", "gpt-4.5", "gpt-5", "chatgpt-4o"];

/// Resolves the token-limit parameter for a model name (case-insensitive).
pub fn token_limit_param(model: &str) -> TokenLimitParam {
    let model_lower = model.to_lowercase();
    if MAX_COMPLETION_TOKEN_FAMILIES
        .iter()
        .any(|family| model_lower.contains(family))
    {
        TokenLimitParam::MaxCompletionTokens
    } else {
        TokenLimitParam::MaxTokens
    }
}
