//! Structured logging for graph execution events.

use std::fmt::Debug;

/// Log node execution start.
pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id = node_id, "Starting node execution");
}

/// Log node execution completion with its routing decision.
pub fn log_node_complete(node_id: &str, next: &crate::graph::Next) {
    tracing::debug!(node_id = node_id, ?next, "Node execution complete");
}

/// Log graph execution start.
pub fn log_graph_start() {
    tracing::info!("Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete() {
    tracing::info!("Graph execution complete");
}

/// Log graph execution error.
pub fn log_graph_error(error: &crate::error::AgentError) {
    tracing::error!(?error, "Graph execution error");
}

/// Log the conditional routing decision taken after a node.
pub fn log_conditional_route(from: &str, to: &str) {
    tracing::debug!(from = %from, to = %to, "conditional routing");
}

/// Log the state at node entry (debug level; states can be large).
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id = node_id, state = ?state, "Node execution: state");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Logging helpers run without panicking.
    #[test]
    fn logging_functions_do_not_panic() {
        log_node_start("validate_input");
        log_node_state("validate_input", &());
        log_node_complete("validate_input", &crate::graph::Next::Continue);
        log_conditional_route("create_plan", "react_reasoning");
        log_graph_start();
        log_graph_complete();
        log_graph_error(&crate::error::AgentError::ExecutionFailed("x".into()));
    }
}
