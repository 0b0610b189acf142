//! OpenAI Chat Completions client implementing [`LlmClient`].
//!
//! Requires `OPENAI_API_KEY` (or explicit config). The token-limit request
//! parameter is chosen per model family via [`token_limit_param`]. Streaming
//! uses `create_stream` and forwards `choices[0].delta.content` as
//! [`MessageChunk`]s.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::message::Message;

use super::params::{token_limit_param, TokenLimitParam};
use super::{LlmClient, LlmError, MessageChunk};

/// OpenAI Chat Completions client.
///
/// Build with [`ChatOpenAI::from_env`] (fails when `OPENAI_API_KEY` is
/// absent — total provider unavailability is fatal, per the error policy)
/// or [`ChatOpenAI::with_config`] for an explicit key / base URL.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Builds a client from the environment. Errors when `OPENAI_API_KEY`
    /// is not set: there is no degraded mode for a provider that cannot be
    /// reached at all.
    pub fn from_env(model: impl Into<String>) -> Result<Self, LlmError> {
        if std::env::var("OPENAI_API_KEY").unwrap_or_default().is_empty() {
            return Err(LlmError::Unavailable(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        })
    }

    /// Builds a client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Sets the sampling temperature (0–2). Lower is more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Converts our `Message` list to OpenAI request messages.
    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => {
                    ChatCompletionRequestMessage::Assistant((s.as_str()).into())
                }
            })
            .collect()
    }

    fn build_request(
        &self,
        messages: &[Message],
        max_tokens: u32,
        stream: bool,
    ) -> Result<async_openai::types::chat::CreateChatCompletionRequest, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));
        match token_limit_param(&self.model) {
            TokenLimitParam::MaxTokens => {
                args.max_tokens(max_tokens);
            }
            TokenLimitParam::MaxCompletionTokens => {
                args.max_completion_tokens(max_tokens);
            }
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if stream {
            args.stream(true);
        }
        args.build()
            .map_err(|e| LlmError::Call(format!("OpenAI request build failed: {}", e)))
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> Result<String, LlmError> {
        let request = self.build_request(messages, max_tokens, false)?;
        debug!(
            model = %self.model,
            message_count = messages.len(),
            max_tokens = max_tokens,
            "OpenAI chat create"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Call(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Call("OpenAI returned no choices".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        max_tokens: u32,
        chunk_tx: mpsc::Sender<MessageChunk>,
    ) -> Result<String, LlmError> {
        let request = self.build_request(messages, max_tokens, true)?;
        debug!(
            model = %self.model,
            message_count = messages.len(),
            max_tokens = max_tokens,
            stream = true,
            "OpenAI chat create_stream"
        );

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| LlmError::Call(format!("OpenAI stream error: {}", e)))?;

        let mut full_content = String::new();
        while let Some(result) = stream.next().await {
            let response =
                result.map_err(|e| LlmError::Call(format!("OpenAI stream error: {}", e)))?;
            for choice in response.choices {
                if let Some(ref content) = choice.delta.content {
                    if !content.is_empty() {
                        full_content.push_str(content);
                        trace!(delta_len = content.len(), "stream delta");
                        // Receiver dropping is not an error; keep accumulating.
                        let _ = chunk_tx
                            .send(MessageChunk {
                                content: content.clone(),
                            })
                            .await;
                    }
                }
            }
        }
        Ok(full_content)
    }
}
