//! Agent runner: one question in, one answered state out.
//!
//! [`LineAgent`] wires the per-run collaborators into a [`PhaseContext`],
//! compiles the phase graph once, and exposes `run()` (plain) and
//! `stream()` (phase steps + answer deltas as [`AgentEvent`]s). After
//! synthesis the turn is persisted to conversation memory and the rolling
//! summary is refreshed on its interval — both best-effort.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::graph::{CompiledStateGraph, StreamEvent, StreamMode};
use crate::llm::{LlmClient, LlmError, MessageChunk};
use crate::memory::{maybe_refresh_summary, ConversationMemory, ConversationStore};
use crate::phases::{build_agent_graph, PhaseContext};
use crate::prompts::{PromptSet, PromptSource};
use crate::state::{AgentRunState, Phase};
use crate::synthesis::{build_synthesis_messages, ensure_answer, SYNTHESIS_MAX_TOKENS};
use crate::tool_source::{ToolInvoker, ToolSource};

/// Events emitted by [`LineAgent::stream`].
///
/// A stream is a single-producer, ordered, finite sequence: zero or more
/// `Step`s, then `AnswerStart` / `AnswerChunk`* / `AnswerEnd`, ending with
/// exactly one `Final` (or `Error` on a fatal failure). After `Final` the
/// state, including its timeline, is immutable.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// One new timeline entry produced by a phase node.
    Step {
        node_id: String,
        phase: Phase,
        message: String,
    },
    /// Synthesis is about to stream the answer.
    AnswerStart,
    /// One increment of answer text.
    AnswerChunk { text: String },
    /// The answer text is complete.
    AnswerEnd,
    /// Fatal failure; terminal (no Final follows).
    Error { message: String },
    /// Terminal event carrying the full final state.
    Final { state: Box<AgentRunState> },
}

/// The production-line agent: fixed phase pipeline plus synthesis and memory.
pub struct LineAgent {
    ctx: Arc<PhaseContext>,
    graph: CompiledStateGraph<AgentRunState>,
    config: AgentConfig,
}

impl LineAgent {
    /// Builds the agent. Fails loudly when a required prompt is missing or
    /// the pipeline wiring is invalid — both are startup errors.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        store: Arc<dyn ConversationStore>,
        prompt_source: &dyn PromptSource,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        let prompts = Arc::new(PromptSet::resolve(prompt_source)?);
        let invoker = ToolInvoker::new(tools).with_timeout(config.tool_timeout);
        let memory =
            ConversationMemory::new(store).with_summary_interval(config.summary_interval);
        let mut ctx = PhaseContext::new(llm, invoker, memory, prompts);
        ctx.memory_limit = config.memory_limit;
        let ctx = Arc::new(ctx);
        let graph = build_agent_graph(ctx.clone())?;
        Ok(Self { ctx, graph, config })
    }

    fn initial_state(&self, question: &str, thread_id: Option<String>) -> AgentRunState {
        AgentRunState::new(question, thread_id)
            .with_react_enabled(self.config.react_enabled)
            .with_react_max_iterations(self.config.react_max_iterations)
    }

    /// Rewrites the final timeline entry's message (the one finalize wrote).
    fn seal_timeline(state: &mut AgentRunState, message: &str) {
        if let Some(last) = state.timeline.last_mut() {
            last.message = message.to_string();
        }
    }

    /// Executes the pipeline and synthesizes the final answer.
    ///
    /// On any recoverable failure the returned state still carries an answer
    /// (possibly a degraded fallback); only total provider unavailability is
    /// an `Err`.
    pub async fn run(
        &self,
        question: &str,
        thread_id: Option<String>,
    ) -> Result<AgentRunState, AgentError> {
        let initial = self.initial_state(question, thread_id);
        let thread_id = initial.thread_id.clone();

        let mut state = self.graph.invoke(initial).await?;

        let memory_context = self.ctx.memory_block(&thread_id).await;
        let messages = build_synthesis_messages(&self.ctx.prompts, &state, &memory_context);
        match self.ctx.complete(&messages, SYNTHESIS_MAX_TOKENS).await? {
            Ok(text) => {
                state.data.answer = Some(ensure_answer(&text));
                Self::seal_timeline(&mut state, "Response complete");
            }
            Err(call_err) => {
                state.data.answer = Some(format!("Unable to generate response: {}", call_err));
                Self::seal_timeline(&mut state, "Response failed");
            }
        }

        store_turn(
            &self.ctx.memory,
            &self.ctx,
            &thread_id,
            question,
            state.answer(),
        )
        .await;
        Ok(state)
    }

    /// Streaming variant: phase steps as they happen, then the answer as
    /// incremental chunks, ending with the full final state.
    pub fn stream(
        &self,
        question: &str,
        thread_id: Option<String>,
    ) -> ReceiverStream<AgentEvent> {
        let (tx, rx) = mpsc::channel(64);
        let initial = self.initial_state(question, thread_id);
        let thread_id = initial.thread_id.clone();
        let question = question.to_string();
        let graph = self.graph.clone();
        let ctx = self.ctx.clone();
        let memory = self.ctx.memory.clone();

        tokio::spawn(async move {
            let mut graph_events = graph.stream(initial, StreamMode::Updates);
            let mut emitted_entries = 0usize;
            let mut final_state: Option<AgentRunState> = None;

            while let Some(event) = graph_events.next().await {
                match event {
                    StreamEvent::Updates { node_id, state } => {
                        for entry in state.timeline.iter().skip(emitted_entries) {
                            let _ = tx
                                .send(AgentEvent::Step {
                                    node_id: node_id.clone(),
                                    phase: entry.phase,
                                    message: entry.message.clone(),
                                })
                                .await;
                        }
                        emitted_entries = state.timeline.len();
                        final_state = Some(state);
                    }
                    StreamEvent::Error(message) => {
                        let _ = tx.send(AgentEvent::Error { message }).await;
                        return;
                    }
                    StreamEvent::Values(_) => {}
                }
            }

            let Some(mut state) = final_state else {
                let _ = tx
                    .send(AgentEvent::Error {
                        message: "pipeline produced no state".to_string(),
                    })
                    .await;
                return;
            };

            let _ = tx.send(AgentEvent::AnswerStart).await;
            let memory_context = memory
                .render_context(&thread_id, ctx.memory_limit)
                .await;
            let messages = build_synthesis_messages(&ctx.prompts, &state, &memory_context);

            let (chunk_tx, mut chunk_rx) = mpsc::channel::<MessageChunk>(32);
            let forward_tx = tx.clone();
            let forward = async move {
                while let Some(chunk) = chunk_rx.recv().await {
                    let _ = forward_tx
                        .send(AgentEvent::AnswerChunk {
                            text: chunk.content,
                        })
                        .await;
                }
            };
            let (result, ()) = tokio::join!(
                ctx.llm
                    .complete_stream(&messages, SYNTHESIS_MAX_TOKENS, chunk_tx),
                forward,
            );

            match result {
                Ok(text) => {
                    state.data.answer = Some(ensure_answer(&text));
                    Self::seal_timeline(&mut state, "Response complete");
                }
                Err(LlmError::Call(msg)) => {
                    let degraded = format!("Unable to generate response: {}", msg);
                    let _ = tx
                        .send(AgentEvent::AnswerChunk {
                            text: degraded.clone(),
                        })
                        .await;
                    state.data.answer = Some(degraded);
                    Self::seal_timeline(&mut state, "Response failed");
                }
                Err(LlmError::Unavailable(msg)) => {
                    let _ = tx.send(AgentEvent::Error { message: msg }).await;
                    return;
                }
            }
            let _ = tx.send(AgentEvent::AnswerEnd).await;

            // Persist before Final so the round-trip property holds as soon
            // as the terminal event is observed.
            let answer = state.data.answer.clone();
            store_turn(&memory, &ctx, &thread_id, &question, answer.as_deref()).await;

            let _ = tx
                .send(AgentEvent::Final {
                    state: Box::new(state),
                })
                .await;
        });

        ReceiverStream::new(rx)
    }
}

/// Persists one turn and conditionally refreshes the summary. Best-effort:
/// memory failures are logged, never propagated.
async fn store_turn(
    memory: &ConversationMemory,
    ctx: &Arc<PhaseContext>,
    thread_id: &str,
    question: &str,
    answer: Option<&str>,
) {
    let store = memory.store();
    if let Err(e) = store.add_message(thread_id, "user", question).await {
        warn!(error = %e, "persisting user turn failed");
        return;
    }
    if let Some(answer) = answer.filter(|a| !a.is_empty()) {
        if let Err(e) = store.add_message(thread_id, "assistant", answer).await {
            warn!(error = %e, "persisting assistant turn failed");
        }
        maybe_refresh_summary(ctx.llm.as_ref(), memory, &ctx.prompts, thread_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::memory::InMemoryConversationStore;
    use crate::prompts::{StaticPromptSource, REQUIRED_PROMPTS};
    use crate::tool_source::MockToolSource;

    fn prompt_source() -> StaticPromptSource {
        StaticPromptSource::from_pairs(REQUIRED_PROMPTS.iter().map(|n| (*n, format!("[{}]", n))))
    }

    fn agent_with(llm: MockLlm) -> LineAgent {
        LineAgent::new(
            Arc::new(llm),
            Arc::new(MockToolSource::with_demo_tools()),
            Arc::new(InMemoryConversationStore::new()),
            &prompt_source(),
            AgentConfig::default(),
        )
        .unwrap()
    }

    /// **Scenario**: Construction fails loudly when a required prompt is missing.
    #[test]
    fn construction_fails_on_missing_prompt() {
        let incomplete = StaticPromptSource::from_pairs([("input-validation-system", "x")]);
        let result = LineAgent::new(
            Arc::new(MockLlm::always("y")),
            Arc::new(MockToolSource::with_demo_tools()),
            Arc::new(InMemoryConversationStore::new()),
            &incomplete,
            AgentConfig::default(),
        );
        assert!(matches!(result.err(), Some(AgentError::Prompt(_))));
    }

    /// **Scenario**: Even with an LLM that fails every call, run() returns a
    /// state with a non-empty degraded answer (no raw error escapes).
    #[tokio::test]
    async fn run_with_failing_llm_still_answers() {
        let agent = agent_with(MockLlm::failing());
        let state = agent.run("how is the line?", None).await.unwrap();
        let answer = state.answer().unwrap();
        assert!(answer.starts_with("Unable to generate response"));
        assert_eq!(state.timeline.last().unwrap().message, "Response failed");
        assert!(!state.timeline.is_empty());
    }
}
