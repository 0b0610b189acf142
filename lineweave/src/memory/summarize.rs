//! Best-effort summary refresh: condense recent turns via the LLM.
//!
//! Fires only on interval boundaries. Every failure (count, read, LLM call,
//! write) is swallowed with a warning; summarization never blocks or fails
//! a run.

use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::prompts::{build_summary_messages, PromptSet};

use super::ConversationMemory;

/// How many recent messages feed the summary prompt.
pub const SUMMARY_RECENT_LIMIT: usize = 16;

/// Token budget for the summary completion.
pub const SUMMARY_MAX_TOKENS: u32 = 320;

/// Refreshes the thread summary when the interval boundary is hit.
///
/// Returns `true` when a new summary was stored (used by tests; callers
/// ignore it).
pub async fn maybe_refresh_summary(
    llm: &dyn LlmClient,
    memory: &ConversationMemory,
    prompts: &PromptSet,
    thread_id: &str,
) -> bool {
    if !memory.should_summarize(thread_id).await {
        return false;
    }

    let recent = match memory.store().get_recent(thread_id, SUMMARY_RECENT_LIMIT).await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "summary refresh: recent read failed");
            return false;
        }
    };
    let prior = match memory.store().get_summary(thread_id).await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "summary refresh: prior summary read failed");
            None
        }
    };

    let turns: Vec<(String, String)> = recent
        .iter()
        .map(|m| (m.role.clone(), m.content.clone()))
        .collect();
    let messages = build_summary_messages(prompts, prior.as_deref(), &turns);

    let summary = match llm.complete(&messages, SUMMARY_MAX_TOKENS).await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "summary refresh: completion failed");
            return false;
        }
    };
    let summary = summary.trim();
    if summary.is_empty() {
        debug!("summary refresh: empty completion, keeping prior summary");
        return false;
    }

    match memory.store().set_summary(thread_id, summary).await {
        Ok(()) => {
            debug!(thread_id = %thread_id, "summary refreshed");
            true
        }
        Err(e) => {
            warn!(error = %e, "summary refresh: write failed");
            false
        }
    }
}
