//! Mock LLM for tests and the CLI demo mode.
//!
//! Returns scripted replies in order; when the script runs out, keeps
//! returning the last reply. A failing mode simulates per-call errors so
//! phase fallbacks can be exercised.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::message::Message;

use super::{LlmClient, LlmError, MessageChunk};

/// One scripted outcome for a mock call.
enum Scripted {
    Reply(String),
    CallFailure(String),
}

/// Mock LLM: scripted replies, optional per-call failures.
///
/// Phases call the LLM in a fixed order (validate, understand, plan, react…,
/// synthesize), so a test scripts exactly the replies it expects to be
/// consumed. `always` is the single-reply convenience for tests that only
/// care about one phase.
pub struct MockLlm {
    script: Mutex<VecDeque<Scripted>>,
    /// Last reply, repeated when the script is exhausted.
    last: Mutex<Option<String>>,
    /// When true, every call past the script fails (instead of repeating).
    fail_forever: bool,
    /// When true, invoke_stream sends each character as a separate chunk.
    stream_by_char: AtomicBool,
}

impl MockLlm {
    /// Scripted replies, consumed in order; the last one repeats thereafter.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| Scripted::Reply(r.into()))
                    .collect(),
            ),
            last: Mutex::new(None),
            fail_forever: false,
            stream_by_char: AtomicBool::new(false),
        }
    }

    /// Always returns the same reply.
    pub fn always(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(Some(reply)),
            fail_forever: false,
            stream_by_char: AtomicBool::new(false),
        }
    }

    /// Every call fails with a recoverable call error (phase fallbacks fire).
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            fail_forever: true,
            stream_by_char: AtomicBool::new(false),
        }
    }

    /// Appends a scripted call failure at the back of the queue (builder).
    pub fn then_failure(self, message: &str) -> Self {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(Scripted::CallFailure(message.to_string()));
        self
    }

    /// Enables character-by-character streaming for `complete_stream`.
    pub fn with_stream_by_char(self) -> Self {
        self.stream_by_char.store(true, Ordering::SeqCst);
        self
    }

    fn next_scripted(&self) -> Result<String, LlmError> {
        let mut script = self.script.lock().expect("mock script lock");
        match script.pop_front() {
            Some(Scripted::Reply(r)) => {
                *self.last.lock().expect("mock last lock") = Some(r.clone());
                Ok(r)
            }
            Some(Scripted::CallFailure(msg)) => Err(LlmError::Call(msg)),
            None if self.fail_forever => Err(LlmError::Call("mock call failure".to_string())),
            None => Ok(self
                .last
                .lock()
                .expect("mock last lock")
                .clone()
                .unwrap_or_default()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, _messages: &[Message], _max_tokens: u32) -> Result<String, LlmError> {
        self.next_scripted()
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        max_tokens: u32,
        chunk_tx: mpsc::Sender<MessageChunk>,
    ) -> Result<String, LlmError> {
        let text = self.complete(messages, max_tokens).await?;
        if self.stream_by_char.load(Ordering::SeqCst) {
            for c in text.chars() {
                let _ = chunk_tx
                    .send(MessageChunk {
                        content: c.to_string(),
                    })
                    .await;
            }
        } else if !text.is_empty() {
            let _ = chunk_tx
                .send(MessageChunk {
                    content: text.clone(),
                })
                .await;
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Scripted replies are consumed in order; the last repeats.
    #[tokio::test]
    async fn scripted_replies_in_order_then_repeat() {
        let llm = MockLlm::with_replies(["first", "second"]);
        assert_eq!(llm.complete(&[], 100).await.unwrap(), "first");
        assert_eq!(llm.complete(&[], 100).await.unwrap(), "second");
        assert_eq!(llm.complete(&[], 100).await.unwrap(), "second");
    }

    /// **Scenario**: failing() produces recoverable call errors, not Unavailable.
    #[tokio::test]
    async fn failing_mock_yields_call_errors() {
        let llm = MockLlm::failing();
        match llm.complete(&[], 100).await {
            Err(LlmError::Call(_)) => {}
            other => panic!("expected Call error, got {:?}", other.map(|_| ())),
        }
    }

    /// **Scenario**: Character streaming sends one chunk per char and returns full text.
    #[tokio::test]
    async fn stream_by_char_sends_individual_chunks() {
        let llm = MockLlm::always("abc").with_stream_by_char();
        let (tx, mut rx) = mpsc::channel(16);
        let full = llm.complete_stream(&[], 100, tx).await.unwrap();
        assert_eq!(full, "abc");
        let mut collected = String::new();
        while let Some(chunk) = rx.recv().await {
            collected.push_str(&chunk.content);
        }
        assert_eq!(collected, "abc");
    }
}
