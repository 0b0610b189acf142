//! In-memory conversation store for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{ConversationStore, MemoryError, StoredMessage};

#[derive(Default)]
struct Inner {
    /// (thread_id, message) in insertion order.
    messages: Vec<(String, StoredMessage)>,
    summaries: HashMap<String, String>,
}

/// Volatile store: one mutex serializes writes; reads clone out of it.
#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: Mutex<Inner>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn add_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), MemoryError> {
        self.inner.lock().await.messages.push((
            thread_id.to_string(),
            StoredMessage {
                role: role.to_string(),
                content: content.to_string(),
                created_at: Utc::now(),
            },
        ));
        Ok(())
    }

    async fn get_recent(
        &self,
        thread_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, MemoryError> {
        let inner = self.inner.lock().await;
        let thread_messages: Vec<StoredMessage> = inner
            .messages
            .iter()
            .filter(|(t, _)| t == thread_id)
            .map(|(_, m)| m.clone())
            .collect();
        let start = thread_messages.len().saturating_sub(limit);
        Ok(thread_messages[start..].to_vec())
    }

    async fn get_summary(&self, thread_id: &str) -> Result<Option<String>, MemoryError> {
        Ok(self.inner.lock().await.summaries.get(thread_id).cloned())
    }

    async fn set_summary(&self, thread_id: &str, summary: &str) -> Result<(), MemoryError> {
        self.inner
            .lock()
            .await
            .summaries
            .insert(thread_id.to_string(), summary.to_string());
        Ok(())
    }

    async fn count_messages(&self, thread_id: &str) -> Result<usize, MemoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .messages
            .iter()
            .filter(|(t, _)| t == thread_id)
            .count())
    }
}
