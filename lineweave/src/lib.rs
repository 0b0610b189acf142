//! # LineWeave
//!
//! A production-line analytics agent in Rust with a **state-in, state-out**
//! design: one [`AgentRunState`] flows through a fixed graph of phases, each
//! phase filling its own fields strictly additively and appending to the
//! audit timeline.
//!
//! ## Design principles
//!
//! - **Fixed pipeline**: Validate → Understand → Plan →
//!   {ReAct loop | sequential executor | direct} → Validate-Output →
//!   Finalize, wired as a [`StateGraph`] with conditional edges. The phase
//!   sequence is not user-programmable.
//! - **Fail open, degrade loudly**: every LLM and tool failure is converted
//!   at the phase boundary into a safe default plus a timeline entry. The
//!   user always gets an answer; only total provider unavailability aborts
//!   a run.
//! - **Bounded autonomy**: the ReAct loop's iteration cap is enforced by the
//!   router, independent of model behavior.
//! - **Explicit context**: phases receive their collaborators through a
//!   [`PhaseContext`] — no ambient or global state.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`] —
//!   build and run the phase graph.
//! - [`phases`]: the phase nodes, routers, and [`build_agent_graph`].
//! - [`state`]: [`AgentRunState`] and its typed sub-structures.
//! - [`llm`]: [`LlmClient`], [`ChatOpenAI`], [`MockLlm`], token-parameter
//!   mapping per model family.
//! - [`parse`]: extractors for strict-JSON replies and the ReAct grammar.
//! - [`prompts`]: named prompt resolution (fail-loud) and message builders.
//! - [`tool_source`]: [`ToolSource`], argument validation, the
//!   timeout-owning [`ToolInvoker`], and [`MockToolSource`].
//! - [`memory`]: the conversation store contract, SQLite backend, summary
//!   policy, and context rendering.
//! - [`synthesis`]: the final-answer prompt templates.
//! - [`agent`]: [`LineAgent`] — `run()` and `stream()` entry points.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lineweave::{
//!     AgentConfig, LineAgent, MockLlm, MockToolSource,
//!     InMemoryConversationStore, StaticPromptSource, REQUIRED_PROMPTS,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let prompts = StaticPromptSource::from_pairs(
//!     REQUIRED_PROMPTS.iter().map(|n| (*n, format!("prompt for {}", n))),
//! );
//! let agent = LineAgent::new(
//!     Arc::new(MockLlm::always("Thought: done\nAction: finish\nAction Input: {\"answer\": \"ok\"}")),
//!     Arc::new(MockToolSource::with_demo_tools()),
//!     Arc::new(InMemoryConversationStore::new()),
//!     &prompts,
//!     AgentConfig::default(),
//! )?;
//! let state = agent.run("how is the line doing?", None).await?;
//! println!("{}", state.answer().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod parse;
pub mod phases;
pub mod prompts;
pub mod state;
pub mod synthesis;
pub mod tool_source;

pub use agent::{AgentEvent, LineAgent};
pub use config::AgentConfig;
pub use error::AgentError;
pub use graph::{CompiledStateGraph, Next, Node, StateGraph, END, START};
pub use llm::{ChatOpenAI, LlmClient, LlmError, MockLlm};
pub use memory::{
    ConversationMemory, ConversationStore, InMemoryConversationStore, SqliteConversationStore,
};
pub use message::Message;
pub use phases::{build_agent_graph, PhaseContext};
pub use prompts::{
    PromptSet, PromptSource, StaticPromptSource, YamlPromptSource, REQUIRED_PROMPTS,
};
pub use state::{AgentRunState, Phase, ValidationStatus};
pub use synthesis::FALLBACK_ANSWER;
pub use tool_source::{MockToolSource, ToolInvoker, ToolSource, ToolSpec};
