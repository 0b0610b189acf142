//! Top-level agent execution errors.
//!
//! Recoverable phase failures (a validation call that errors, a tool that
//! times out, a reply that does not parse) never surface here: phases convert
//! them into degraded state plus a timeline entry. This enum carries only
//! what is allowed to escape a run.

use thiserror::Error;

use crate::graph::CompilationError;
use crate::prompts::PromptError;

/// Error returned by `LineAgent::run` / `stream` and by graph execution.
///
/// `ProviderUnavailable` is the one fatal case from the completion provider:
/// no credentials or no connection at all. Everything the provider does
/// *after* a call starts (bad reply, transient failure) is degraded in-phase
/// instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Completion provider cannot be reached at all (missing credentials,
    /// no connection). Fatal for the whole run.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The phase graph failed to compile (bad wiring; a programming error).
    #[error("graph compilation failed: {0}")]
    Compilation(#[from] CompilationError),

    /// A required named prompt is missing from the prompt source.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Graph execution failed with a message (e.g. empty graph).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}
