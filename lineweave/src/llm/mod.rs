//! LLM call adapter: send a message list to a completion provider, get text back.
//!
//! Phases depend on the [`LlmClient`] trait, not a concrete provider.
//! Implementations: [`MockLlm`] (scripted replies for tests) and
//! [`ChatOpenAI`] (real API via async-openai).
//!
//! # Streaming
//!
//! `complete_stream()` accepts an `mpsc::Sender<MessageChunk>`; implementations
//! that support token streaming send chunks as they arrive and still return
//! the full text at the end. The default implementation calls `complete()`
//! and sends the whole reply as one chunk.

mod mock;
mod openai;
mod params;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;
pub use params::{token_limit_param, TokenLimitParam};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::message::Message;

/// One incremental piece of streamed completion text.
#[derive(Debug, Clone)]
pub struct MessageChunk {
    pub content: String,
}

/// Errors from the completion provider.
///
/// `Unavailable` is fatal for the whole run (no credentials / no
/// connection); `Call` is recoverable and is degraded at the phase boundary.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider cannot be used at all (e.g. missing API key).
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// A single completion call failed (network, API error, no choices).
    #[error("completion call failed: {0}")]
    Call(String),
}

/// LLM client: given messages and a token budget, return completion text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One completion call. `max_tokens` is mapped to the provider's
    /// token-limit parameter by model family (see [`token_limit_param`]).
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> Result<String, LlmError>;

    /// Streaming variant: sends [`MessageChunk`]s through `chunk_tx` as they
    /// arrive and returns the complete text. Default implementation delegates
    /// to `complete()` and emits the full reply as a single chunk.
    async fn complete_stream(
        &self,
        messages: &[Message],
        max_tokens: u32,
        chunk_tx: mpsc::Sender<MessageChunk>,
    ) -> Result<String, LlmError> {
        let text = self.complete(messages, max_tokens).await?;
        if !text.is_empty() {
            let _ = chunk_tx
                .send(MessageChunk {
                    content: text.clone(),
                })
                .await;
        }
        Ok(text)
    }
}
