//! Conditional edges: route to the next node based on state.
//!
//! A source node may have a routing function that takes the current state and
//! returns a key; the key is either used as the next node id directly or
//! looked up in an optional path map.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Router function: takes a reference to state and returns a routing key.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Conditional edge definition: routing function plus optional path map.
///
/// - `path_map` is `None`: the router's return value is the next node id.
/// - `path_map` is `Some(map)`: the return value is the key; next node is
///   `map[key]` if present, otherwise the key itself.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id (or END) from the current state.
    pub fn resolve_next(&self, state: &S) -> String {
        let key = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key)
    }
}

/// How to determine the next node after a given node runs.
///
/// `Unconditional(to_id)` for a single outgoing edge; `Conditional(router)`
/// when the next node is decided from state at runtime.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single fixed next node (or END). The node's own `Next` is still respected.
    Unconditional(String),
    /// Next node is decided by the router; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Without a path map, the router key is the next node id.
    #[test]
    fn resolve_next_without_path_map_uses_key() {
        let router =
            ConditionalRouter::<i32>::new(Arc::new(|s| format!("node{}", s)), None);
        assert_eq!(router.resolve_next(&7), "node7");
    }

    /// **Scenario**: With a path map, the key is translated; unknown keys pass through.
    #[test]
    fn resolve_next_with_path_map_translates_key() {
        let map: HashMap<String, String> =
            [("yes".to_string(), "act".to_string())].into_iter().collect();
        let router = ConditionalRouter::<bool>::new(
            Arc::new(|s| if *s { "yes".into() } else { "no".into() }),
            Some(map),
        );
        assert_eq!(router.resolve_next(&true), "act");
        assert_eq!(router.resolve_next(&false), "no");
    }
}
