//! Phase-pipeline engine: build and run state graphs.
//!
//! The fixed agent pipeline is expressed as a [`StateGraph`]: one
//! [`Node`] per phase, plain edges for the fixed transitions, and
//! conditional edges for the three routing decisions (after input
//! validation, after planning, after each ReAct action). `compile()`
//! validates the wiring up front; [`CompiledStateGraph::invoke`] runs a
//! state through it, [`CompiledStateGraph::stream`] additionally emits
//! per-node [`StreamEvent`]s.

mod compile_error;
mod compiled;
mod conditional;
pub mod logging;
mod next;
mod node;
mod state_graph;
mod stream;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use next::Next;
pub use node::Node;
pub use state_graph::{StateGraph, END, START};
pub use stream::{StreamEvent, StreamMode};
