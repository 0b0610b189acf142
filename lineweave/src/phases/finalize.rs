//! Finalize phase: mark the state ready for synthesis.
//!
//! The synthesizer itself runs outside the graph (it may stream); this node
//! just seals the pipeline with the synthesis timeline entry — the one whose
//! message the runner rewrites to "Response complete" / "Response failed".

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::{AgentRunState, Phase};

use super::NODE_FINALIZE;

/// Phase node: last stop before synthesis.
pub struct FinalizeNode;

impl FinalizeNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FinalizeNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node<AgentRunState> for FinalizeNode {
    fn id(&self) -> &str {
        NODE_FINALIZE
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        state.record_step(Phase::Synthesis, "Preparing response");
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Finalize appends exactly one synthesis entry.
    #[tokio::test]
    async fn finalize_appends_synthesis_entry() {
        let node = FinalizeNode::new();
        let state = AgentRunState::new("q", None);
        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(state.timeline.len(), 1);
        assert_eq!(state.timeline[0].phase, Phase::Synthesis);
        assert_eq!(state.timeline[0].message, "Preparing response");
    }
}
