//! Stream events emitted during graph execution.

use std::collections::HashSet;

/// What a graph stream should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Full state snapshot after each node.
    Values,
    /// Per-node update: node id plus the state after it ran.
    Updates,
}

impl From<StreamMode> for HashSet<StreamMode> {
    fn from(mode: StreamMode) -> Self {
        HashSet::from_iter([mode])
    }
}

/// One event from [`CompiledStateGraph::stream`](super::CompiledStateGraph::stream).
#[derive(Debug, Clone)]
pub enum StreamEvent<S> {
    /// Full state snapshot after a node ran (StreamMode::Values).
    Values(S),
    /// Node id plus state after it ran (StreamMode::Updates).
    Updates { node_id: String, state: S },
    /// The run failed; always emitted (regardless of mode) as the last event.
    Error(String),
}
