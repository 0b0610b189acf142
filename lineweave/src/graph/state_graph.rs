//! State graph: nodes + explicit edges (from → to) and optional conditional edges.
//!
//! Add nodes with `add_node`, define the chain with `add_edge(from, to)` using
//! `START` and `END` for graph entry/exit. Use `add_conditional_edges` to
//! route based on state. Then `compile()` to get a [`CompiledStateGraph`].
//!
//! A node must have either one outgoing `add_edge` or `add_conditional_edges`,
//! not both. With conditional edges the graph may branch and loop (the ReAct
//! cycle); without them the edges must form a single linear chain.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use super::compile_error::CompilationError;
use super::compiled::CompiledStateGraph;
use super::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use super::node::Node;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph builder: nodes plus explicit edges and optional conditional edges.
///
/// Generic over state type `S`. Compile validates all wiring up front so an
/// unknown node id is a startup error, never a per-run surprise.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
        }
    }

    /// Adds a node; id must be unique. Replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id` (`START` / `END` for entry/exit).
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: after the node runs, `path(state)`
    /// returns a key that is resolved (through `path_map` when given) to the
    /// next node id or END.
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph: validates that all referenced node ids
    /// exist, that exactly one edge leaves START, that END is reachable, and
    /// that no node mixes plain and conditional edges.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(ref path_map) = router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }

        let start_edges: Vec<_> = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone())
            .collect();
        let first = match start_edges.len() {
            0 => return Err(CompilationError::MissingStart),
            1 => start_edges.into_iter().next().unwrap(),
            _ => {
                return Err(CompilationError::InvalidChain(
                    "multiple edges from START (branch)".into(),
                ))
            }
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let non_start_edges: Vec<_> = self
            .edges
            .iter()
            .filter(|(f, _)| f.as_str() != START)
            .collect();
        let edge_froms: HashSet<_> = non_start_edges.iter().map(|(f, _)| f.clone()).collect();
        if edge_froms.len() != non_start_edges.len() {
            return Err(CompilationError::InvalidChain(
                "duplicate from (branch)".into(),
            ));
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = non_start_edges
            .iter()
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in &self.conditional_edges {
            next_map.insert(source.clone(), NextEntry::Conditional(router.clone()));
        }

        // Linear edge order is only meaningful without conditional edges;
        // with routers present, cycles are legitimate (the ReAct loop).
        let mut edge_order = vec![first.clone()];
        if self.conditional_edges.is_empty() {
            let linear_next: HashMap<String, String> = self
                .edges
                .iter()
                .filter(|(f, _)| f.as_str() != START)
                .map(|(f, t)| (f.clone(), t.clone()))
                .collect();
            let mut current = first.clone();
            let mut visited = HashSet::new();
            visited.insert(current.clone());
            loop {
                let next = match linear_next.get(&current) {
                    Some(n) => n.clone(),
                    None => break,
                };
                if next == END {
                    break;
                }
                if visited.contains(&next) {
                    return Err(CompilationError::InvalidChain("cycle detected".into()));
                }
                visited.insert(next.clone());
                edge_order.push(next.clone());
                current = next;
            }
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            edge_order,
            next_map,
        })
    }
}
