//! Legacy sequential tool executor (the non-ReAct path).
//!
//! Iterates the pre-committed plan one call at a time — a correctness
//! choice, not an optimization: shared scratch state stays deterministic.
//! A single bad entry is skipped with a recorded observation and never
//! halts its siblings.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::{AgentRunState, Phase, ToolError};
use crate::tool_source::args::validate_tool_args;

use super::context::PhaseContext;
use super::NODE_EXECUTE_PLAN;

/// Phase node: run the ordered tool plan.
pub struct ExecutePlanNode {
    ctx: Arc<PhaseContext>,
}

impl ExecutePlanNode {
    pub fn new(ctx: Arc<PhaseContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Node<AgentRunState> for ExecutePlanNode {
    fn id(&self) -> &str {
        NODE_EXECUTE_PLAN
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        if state.tool_plan.is_empty() {
            state.record_step(Phase::Execution, "Skipped (direct response)");
            return Ok((state, Next::Continue));
        }

        state.record_step(
            Phase::Execution,
            format!("Executing {} tool(s)", state.tool_plan.len()),
        );

        let plan = state.tool_plan.clone();
        for item in &plan {
            let display_name = item.name.replace('_', " ");

            let validated = match validate_tool_args(&item.name, &item.args) {
                Ok(v) => v,
                Err(e) => {
                    state
                        .observations
                        .push(format!("Skipped {}: {}", item.name, e));
                    state.record_step(
                        Phase::Execution,
                        format!("Skipped {} (invalid args)", display_name),
                    );
                    continue;
                }
            };

            state.record_step(Phase::Execution, format!("Calling {}", display_name));
            let result = self.ctx.invoker.call(&item.name, validated).await;

            if result.success {
                if let Some(ref data) = result.data {
                    state.data.record_tool_data(&item.name, data);
                }
                state
                    .observations
                    .push(format!("{}: Retrieved successfully", item.name));
                state.record_step_with_keys(
                    Phase::Execution,
                    format!("Retrieved {}", display_name),
                    Some(vec![item.name.clone()]),
                );
            } else {
                state.data.tool_errors.push(ToolError {
                    tool: item.name.clone(),
                    error: result.error.clone(),
                });
                state
                    .observations
                    .push(format!("{}: Error - {}", item.name, result.error));
                state.record_step(
                    Phase::Execution,
                    format!("Error retrieving {}", display_name),
                );
            }
            state.tool_results.insert(item.name.clone(), result);
        }

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::phases::testutil;
    use crate::state::ToolPlanItem;
    use crate::tool_source::{MockToolSource, ToolSourceError};
    use serde_json::json;

    fn plan_item(name: &str, args: serde_json::Value) -> ToolPlanItem {
        ToolPlanItem {
            name: name.into(),
            args,
            purpose: String::new(),
            priority: 1,
        }
    }

    /// **Scenario**: An empty plan is recorded as skipped.
    #[tokio::test]
    async fn empty_plan_is_skipped() {
        let node = ExecutePlanNode::new(testutil::context(MockLlm::always("unused")));
        let state = AgentRunState::new("q", None);
        let (state, _) = node.run(state).await.unwrap();
        assert!(state
            .timeline
            .iter()
            .any(|e| e.message == "Skipped (direct response)"));
    }

    /// **Scenario**: One invalid entry is skipped with an observation while
    /// the remaining plan still executes (siblings unaffected).
    #[tokio::test]
    async fn invalid_entry_does_not_halt_siblings() {
        let node = ExecutePlanNode::new(testutil::context(MockLlm::always("unused")));
        let mut state = AgentRunState::new("q", None);
        state.tool_plan = vec![
            plan_item("get_station_status", json!({})), // missing station_id
            plan_item("get_production_metrics", json!({})),
        ];
        let (state, _) = node.run(state).await.unwrap();

        assert!(state
            .observations
            .iter()
            .any(|o| o.starts_with("Skipped get_station_status")));
        assert!(state.tool_results.contains_key("get_production_metrics"));
        assert!(!state.tool_results.contains_key("get_station_status"));
        assert!(state.data.metrics.is_some());
    }

    /// **Scenario**: Failures land in tool_results and data.tool_errors; the
    /// pipeline keeps going.
    #[tokio::test]
    async fn failure_recorded_and_run_continues() {
        let tools = MockToolSource::with_demo_tools()
            .with_failure("calculate_oee", ToolSourceError::Transport("down".into()));
        let node = ExecutePlanNode::new(testutil::context_with_tools(
            MockLlm::always("unused"),
            tools,
        ));
        let mut state = AgentRunState::new("q", None);
        state.tool_plan = vec![
            plan_item("calculate_oee", json!({})),
            plan_item("find_bottleneck", json!({})),
        ];
        let (state, _) = node.run(state).await.unwrap();

        assert!(!state.tool_results["calculate_oee"].success);
        assert!(state.tool_results["find_bottleneck"].success);
        assert_eq!(state.data.tool_errors.len(), 1);
        assert_eq!(state.data.tool_errors[0].tool, "calculate_oee");
        assert!(state.data.bottleneck.is_some());
    }
}
