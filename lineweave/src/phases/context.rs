//! Per-run phase context and the degraded-outcome type.
//!
//! One [`PhaseContext`] is constructed per run and threaded explicitly into
//! every phase node — no ambient or global state. It owns the collaborators
//! phases talk to: the LLM adapter, the tool invoker, conversation memory,
//! and the resolved prompt set.

use std::sync::Arc;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmError};
use crate::memory::{ConversationMemory, DEFAULT_CONTEXT_LIMIT};
use crate::message::Message;
use crate::prompts::PromptSet;
use crate::tool_source::{ToolInvoker, ToolSpec};

/// A phase result plus whether a fallback produced it.
///
/// Phases return degraded values instead of raising: callers branch on the
/// flag (for timeline wording) rather than intercepting errors.
#[derive(Debug, Clone)]
pub struct PhaseOutcome<T> {
    pub value: T,
    pub degraded: bool,
    pub note: Option<String>,
}

impl<T> PhaseOutcome<T> {
    /// A clean, non-degraded outcome.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            degraded: false,
            note: None,
        }
    }

    /// A fallback outcome with the reason it degraded.
    pub fn degraded(value: T, note: impl Into<String>) -> Self {
        Self {
            value,
            degraded: true,
            note: Some(note.into()),
        }
    }
}

/// Collaborators shared by all phase nodes for one run.
pub struct PhaseContext {
    pub llm: Arc<dyn LlmClient>,
    pub invoker: ToolInvoker,
    pub memory: ConversationMemory,
    pub prompts: Arc<PromptSet>,
    /// Recent turns rendered into each phase prompt.
    pub memory_limit: usize,
}

impl PhaseContext {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        invoker: ToolInvoker,
        memory: ConversationMemory,
        prompts: Arc<PromptSet>,
    ) -> Self {
        Self {
            llm,
            invoker,
            memory,
            prompts,
            memory_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    /// Renders the memory-context block for a thread.
    pub async fn memory_block(&self, thread_id: &str) -> String {
        self.memory.render_context(thread_id, self.memory_limit).await
    }

    /// One phase-level completion call.
    ///
    /// Returns `Ok(Ok(text))` on success, `Ok(Err(message))` on a
    /// recoverable call failure (the phase degrades), and `Err` only on
    /// total provider unavailability, which is fatal for the run.
    pub async fn complete(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<Result<String, String>, AgentError> {
        match self.llm.complete(messages, max_tokens).await {
            Ok(text) => Ok(Ok(text)),
            Err(LlmError::Call(msg)) => Ok(Err(msg)),
            Err(LlmError::Unavailable(msg)) => Err(AgentError::ProviderUnavailable(msg)),
        }
    }

    /// The live capability registry. A listing failure degrades to an empty
    /// set (planning then drops every entry; the action step reports
    /// unknown tools) rather than failing the run.
    pub async fn registered_tools(&self) -> Vec<ToolSpec> {
        match self.invoker.source().list_tools().await {
            Ok(specs) => specs,
            Err(e) => {
                tracing::warn!(error = %e, "tool listing failed; treating registry as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::phases::testutil;

    /// **Scenario**: A recoverable call failure surfaces as Ok(Err(msg));
    /// the phase decides what to do with it.
    #[tokio::test]
    async fn recoverable_call_failure_is_not_fatal() {
        let ctx = testutil::context(MockLlm::failing());
        match ctx.complete(&[], 100).await {
            Ok(Err(msg)) => assert!(msg.contains("mock call failure")),
            other => panic!("expected Ok(Err), got {:?}", other.map(|_| ())),
        }
    }

    /// **Scenario**: Outcome constructors carry the degraded flag and note.
    #[test]
    fn outcome_constructors() {
        let ok = PhaseOutcome::ok(1);
        assert!(!ok.degraded && ok.note.is_none());
        let bad = PhaseOutcome::degraded(2, "fallback used");
        assert!(bad.degraded);
        assert_eq!(bad.note.as_deref(), Some("fallback used"));
    }
}
