//! Graph node trait: one step in a StateGraph.
//!
//! Receives state `S`, returns updated `S` and [`Next`] (continue, jump, or
//! end). Phase nodes implement this; the compiled graph drives them.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
///
/// Return `Next::Continue` to follow the linear edge order, `Next::Node(id)`
/// to jump, or `Next::End` to stop. For nodes with conditional edges the
/// router decides instead.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"validate_input"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (state out, next step).
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
