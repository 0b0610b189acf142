//! Errors reported by `StateGraph::compile`.

use thiserror::Error;

/// Graph wiring problems detected at compile time.
///
/// Compilation closes the "unknown node" gap before any run starts: a graph
/// that compiles only ever routes to registered nodes or END.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// An edge or conditional source references a node id that was never added.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge from START.
    #[error("no edge from START")]
    MissingStart,

    /// No edge or conditional path reaches END.
    #[error("no edge to END")]
    MissingEnd,

    /// The plain edges do not form a valid chain (branch or cycle).
    #[error("invalid chain: {0}")]
    InvalidChain(String),

    /// A node has both an outgoing edge and conditional edges.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A conditional path map targets a node id that was never added.
    #[error("conditional path map targets unknown node: {0}")]
    InvalidConditionalPathMap(String),
}
