//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile`. Holds nodes, the linear edge order, and a
//! next map (unconditional edges and conditional routers). Conditional
//! routers take precedence over the `Next` a node returns.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;

use super::conditional::NextEntry;
use super::logging::{
    log_conditional_route, log_graph_complete, log_graph_error, log_graph_start,
    log_node_complete, log_node_start, log_node_state,
};
use super::state_graph::END;
use super::stream::{StreamEvent, StreamMode};
use super::{Next, Node};

/// Compiled graph: immutable structure, ready to run.
///
/// `invoke` steps through nodes from the entry node until END; `stream` does
/// the same on a spawned task, emitting [`StreamEvent`]s per node.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// First node to run (from START).
    pub(super) first_node_id: String,
    /// Linear order of nodes (used for Next::Continue when no conditional edges).
    pub(super) edge_order: Vec<String>,
    /// Per-node routing: Unconditional(to_id) or Conditional(router).
    pub(super) next_map: HashMap<String, NextEntry<S>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Shared run loop used by invoke() and stream(): steps through nodes until completion.
    async fn run_loop_inner(
        &self,
        state: &mut S,
        current_id: &mut String,
        stream_tx: Option<&mpsc::Sender<StreamEvent<S>>>,
        stream_mode: &HashSet<StreamMode>,
    ) -> Result<(), AgentError> {
        log_graph_start();

        loop {
            let node = self
                .nodes
                .get(current_id)
                .expect("compiled graph has all nodes")
                .clone();

            log_node_start(current_id);
            log_node_state(current_id, &*state);

            let (new_state, next) = match node.run(state.clone()).await {
                Ok(output) => output,
                Err(e) => {
                    log_graph_error(&e);
                    return Err(e);
                }
            };
            log_node_complete(current_id, &next);

            *state = new_state;

            if let Some(tx) = stream_tx {
                if stream_mode.contains(&StreamMode::Updates) {
                    let _ = tx
                        .send(StreamEvent::Updates {
                            node_id: current_id.clone(),
                            state: state.clone(),
                        })
                        .await;
                }
                if stream_mode.contains(&StreamMode::Values) {
                    let _ = tx.send(StreamEvent::Values(state.clone())).await;
                }
            }

            let next_id: Option<String> =
                if let Some(NextEntry::Conditional(router)) = self.next_map.get(current_id) {
                    let target = router.resolve_next(state);
                    log_conditional_route(current_id, &target);
                    Some(target)
                } else {
                    match next {
                        Next::End => None,
                        Next::Node(id) => Some(id),
                        Next::Continue => self
                            .next_map
                            .get(current_id)
                            .and_then(|e| {
                                if let NextEntry::Unconditional(id) = e {
                                    Some(id.clone())
                                } else {
                                    None
                                }
                            })
                            .or_else(|| {
                                let pos = self.edge_order.iter().position(|x| x == current_id)?;
                                self.edge_order.get(pos + 1).cloned()
                            }),
                    }
                };

            match next_id {
                None => {
                    log_graph_complete();
                    return Ok(());
                }
                Some(id) if id == END => {
                    log_graph_complete();
                    return Ok(());
                }
                Some(id) => *current_id = id,
            }
        }
    }

    /// Runs the graph with the given state and returns the final state.
    ///
    /// Every node is awaited in turn; there is no intra-run parallelism.
    pub async fn invoke(&self, state: S) -> Result<S, AgentError> {
        if self.nodes.is_empty() || !self.nodes.contains_key(&self.first_node_id) {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        let mut state = state;
        let mut current_id = self.first_node_id.clone();
        self.run_loop_inner(&mut state, &mut current_id, None, &HashSet::new())
            .await?;
        Ok(state)
    }

    /// Streams graph execution, emitting events via a channel-backed stream.
    ///
    /// The stream is a single-producer ordered finite sequence; it closes
    /// after the final node's event.
    pub fn stream(
        &self,
        state: S,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let mode_set: HashSet<StreamMode> = stream_mode.into();

        tokio::spawn(async move {
            if graph.nodes.is_empty() || !graph.nodes.contains_key(&graph.first_node_id) {
                return;
            }
            let mut state = state;
            let mut current_id = graph.first_node_id.clone();
            if let Err(e) = graph
                .run_loop_inner(&mut state, &mut current_id, Some(&tx), &mode_set)
                .await
            {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        ReceiverStream::new(rx)
    }
}
