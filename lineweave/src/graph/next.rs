//! Next-step result from a graph node: continue the linear chain, jump, or end.

/// Next step after running a node.
///
/// - **Continue**: follow the linear edge order (next node in chain, or END if last).
/// - **Node(id)**: jump to the given node.
/// - **End**: stop; return current state as final result.
///
/// When the current node has conditional edges, the router's decision takes
/// precedence and the returned `Next` is ignored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow linear edge order; if current node is last, equivalent to End.
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
