//! Conversation memory: per-thread message log plus a rolling summary.
//!
//! The logical contract lives in [`ConversationStore`]; the reference
//! backend is SQLite ([`SqliteConversationStore`]), with an in-memory
//! implementation for tests. [`ConversationMemory`] layers the
//! summarization policy and the prompt-context renderer on top of a store.
//!
//! Writes are serialized (per the concurrency model: concurrent runs share
//! only this store); reads are concurrent.

mod in_memory;
mod sqlite;
mod summarize;

pub use in_memory::InMemoryConversationStore;
pub use sqlite::SqliteConversationStore;
pub use summarize::{maybe_refresh_summary, SUMMARY_MAX_TOKENS, SUMMARY_RECENT_LIMIT};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Default interval: a summary refresh fires exactly on multiples of this
/// message count.
pub const DEFAULT_SUMMARY_INTERVAL: usize = 12;

/// Default number of recent turns rendered into prompts.
pub const DEFAULT_CONTEXT_LIMIT: usize = 8;

/// Storage-layer errors. Callers treat memory as best-effort: persistence
/// failures never fail a run.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory storage error: {0}")]
    Storage(String),
}

/// One persisted conversation turn.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Summary plus recent turns for one thread.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    pub summary: Option<String>,
    pub recent: Vec<StoredMessage>,
}

/// Logical contract of the per-thread conversation store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends one message to a thread's log.
    async fn add_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), MemoryError>;

    /// The most recent `limit` messages, in chronological (oldest-first)
    /// order regardless of storage order.
    async fn get_recent(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, MemoryError>;

    /// The thread's rolling summary, when one exists.
    async fn get_summary(&self, thread_id: &str) -> Result<Option<String>, MemoryError>;

    /// Upserts the thread's summary (at most one per thread).
    async fn set_summary(&self, thread_id: &str, summary: &str) -> Result<(), MemoryError>;

    /// Total message count for a thread.
    async fn count_messages(&self, thread_id: &str) -> Result<usize, MemoryError>;
}

/// Conversation memory: a store plus the summarization policy and the
/// prompt-context renderer.
#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn ConversationStore>,
    summary_interval: usize,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
        }
    }

    /// Overrides the summary interval (0 disables summarization).
    pub fn with_summary_interval(mut self, interval: usize) -> Self {
        self.summary_interval = interval;
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn summary_interval(&self) -> usize {
        self.summary_interval
    }

    /// Summarization fires exactly on interval boundaries:
    /// `count >= interval && count % interval == 0`.
    pub async fn should_summarize(&self, thread_id: &str) -> bool {
        if self.summary_interval == 0 {
            return false;
        }
        match self.store.count_messages(thread_id).await {
            Ok(count) => count >= self.summary_interval && count % self.summary_interval == 0,
            Err(e) => {
                tracing::warn!(error = %e, "message count failed; skipping summarization");
                false
            }
        }
    }

    /// Summary + recent turns for a thread. Storage errors yield an empty
    /// context (memory is best-effort on the read side too).
    pub async fn context(&self, thread_id: &str, limit: usize) -> MemoryContext {
        let summary = match self.store.get_summary(thread_id).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "summary read failed");
                None
            }
        };
        let recent = match self.store.get_recent(thread_id, limit).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "recent-messages read failed");
                Vec::new()
            }
        };
        MemoryContext { summary, recent }
    }

    /// Renders the memory context block injected into phase prompts.
    pub async fn render_context(&self, thread_id: &str, limit: usize) -> String {
        render_context(&self.context(thread_id, limit).await)
    }
}

/// Total character budget for the rendered recent turns.
const RECENT_TOTAL_BUDGET: usize = 4000;
/// Per-turn floor so short contexts are never over-trimmed.
const PER_TURN_MIN_BUDGET: usize = 400;
/// Minimum preserved tail of an over-budget turn.
const TAIL_MIN_CHARS: usize = 120;

/// Renders a [`MemoryContext`] for the model prompt.
///
/// Over-budget turns keep their head and tail with an explicit
/// `[trimmed N chars]` marker in between.
pub fn render_context(context: &MemoryContext) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(ref summary) = context.summary {
        if !summary.is_empty() {
            lines.push(format!("Summary: {}", summary));
        }
    }

    if !context.recent.is_empty() {
        lines.push("Recent turns:".to_string());
        let per_turn_budget =
            PER_TURN_MIN_BUDGET.max(RECENT_TOTAL_BUDGET / context.recent.len().max(1));
        for item in &context.recent {
            let chars: Vec<char> = item.content.chars().collect();
            let rendered = if chars.len() <= per_turn_budget {
                item.content.clone()
            } else {
                let head_len = per_turn_budget * 6 / 10;
                let tail_len = TAIL_MIN_CHARS.max(per_turn_budget * 4 / 10);
                let head: String = chars[..head_len].iter().collect();
                let tail: String = chars[chars.len() - tail_len..].iter().collect();
                let trimmed = chars.len() - head_len - tail_len;
                format!("{} ... [trimmed {} chars] ... {}", head, trimmed, tail)
            };
            lines.push(format!("- {}: {}", item.role, rendered));
        }
    }

    lines.join("\n").trim().to_string()
}
