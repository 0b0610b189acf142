//! The ReAct loop nodes: Reason (think) and Act (tool call / finish).
//!
//! Reasoning builds a prompt from the question, the live tool list, and the
//! scratchpad of prior steps, then parses the reply against the labelled
//! grammar. Acting validates the chosen tool and its arguments before
//! invoking it with a timeout; every outcome lands in the current step's
//! observation. The continue/exit decision lives in the router
//! ([`react_continue_route`](super::react_continue_route)), so the cap holds
//! regardless of what the model does.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::parse::{parse_react_reply, ReactReply};
use crate::prompts::{build_react_reasoning_messages, format_react_scratchpad};
use crate::state::{AgentRunState, Phase, ReActStep};
use crate::tool_source::args::validate_tool_args;

use super::context::PhaseContext;
use super::{NODE_REACT_ACTION, NODE_REACT_REASONING};

const REASONING_MAX_TOKENS: u32 = 600;
const THOUGHT_PREVIEW_CHARS: usize = 80;

/// The designated terminal action.
pub const FINISH_ACTION: &str = "finish";

/// Reason node: one thinking step of the loop.
pub struct ReasonNode {
    ctx: Arc<PhaseContext>,
}

impl ReasonNode {
    pub fn new(ctx: Arc<PhaseContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Node<AgentRunState> for ReasonNode {
    fn id(&self) -> &str {
        NODE_REACT_REASONING
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        // Entering with the budget already spent produces no step; the
        // router exits immediately. Keeps iteration <= max unconditionally.
        if state.react_iteration >= state.react_max_iterations {
            state.record_step(
                Phase::ReactReasoning,
                format!(
                    "Iteration budget exhausted ({}/{})",
                    state.react_iteration, state.react_max_iterations
                ),
            );
            return Ok((state, Next::Continue));
        }

        let iteration = state.react_iteration + 1;
        state.record_step(
            Phase::ReactReasoning,
            format!(
                "ReAct iteration {}/{}",
                iteration, state.react_max_iterations
            ),
        );

        let tools = self.ctx.registered_tools().await;
        let scratchpad = format_react_scratchpad(&state.react_steps);
        let memory_context = self.ctx.memory_block(&state.thread_id).await;
        let messages = build_react_reasoning_messages(
            &self.ctx.prompts,
            &state.question,
            &tools,
            &scratchpad,
            &memory_context,
        );

        let reply = match self.ctx.complete(&messages, REASONING_MAX_TOKENS).await? {
            Ok(text) => parse_react_reply(&text),
            // A failed call degrades like unparseable output: the step
            // advances with an empty action and the loop keeps its bound.
            Err(call_err) => ReactReply {
                thought: String::new(),
                action: String::new(),
                action_input: json!({ "raw": call_err.clone() }),
                parse_error: Some(call_err),
            },
        };

        let thought_preview: String = reply.thought.chars().take(THOUGHT_PREVIEW_CHARS).collect();
        let action_label = if reply.action.is_empty() {
            "unknown".to_string()
        } else {
            reply.action.clone()
        };
        let message = match &reply.parse_error {
            Some(err) => format!("Reasoning degraded ({}) → Action: {}", err, action_label),
            None => format!("Thought: {}... → Action: {}", thought_preview, action_label),
        };

        state.react_steps.push(ReActStep {
            iteration,
            thought: reply.thought,
            action: reply.action,
            action_input: reply.action_input,
            observation: String::new(),
        });
        state.react_iteration = iteration;
        state.record_step(Phase::ReactReasoning, message);

        Ok((state, Next::Continue))
    }
}

/// Renders a successful tool payload into an observation string.
fn render_observation(data: &Option<Value>) -> String {
    match data {
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        None => "null".to_string(),
    }
}

/// Extracts the final answer from a finish action's input.
fn finish_answer(action_input: &Value) -> String {
    match action_input.get("answer").and_then(Value::as_str) {
        Some(answer) => answer.to_string(),
        None => action_input.to_string(),
    }
}

/// Act node: execute the most recent step's action and observe the result.
pub struct ActNode {
    ctx: Arc<PhaseContext>,
}

impl ActNode {
    pub fn new(ctx: Arc<PhaseContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Node<AgentRunState> for ActNode {
    fn id(&self) -> &str {
        NODE_REACT_ACTION
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        let Some(step_index) = state.react_steps.len().checked_sub(1) else {
            state.record_step(Phase::ReactAction, "No action to execute");
            return Ok((state, Next::Continue));
        };

        let action = state.react_steps[step_index]
            .action
            .trim()
            .to_lowercase();
        let action_input = state.react_steps[step_index].action_input.clone();

        if action == FINISH_ACTION {
            let answer = finish_answer(&action_input);
            state.react_steps[step_index].observation = format!("Final Answer: {}", answer);
            state.record_step(Phase::ReactAction, "Agent decided to finish");
            return Ok((state, Next::Continue));
        }

        state.record_step(Phase::ReactAction, format!("Executing tool: {}", action));

        let valid_names: Vec<String> = self
            .ctx
            .registered_tools()
            .await
            .into_iter()
            .map(|t| t.name)
            .collect();

        if !valid_names.iter().any(|n| n == &action) {
            let observation = format!(
                "Error: Tool '{}' not found. Available tools: {}",
                action,
                valid_names.join(", ")
            );
            state.react_steps[step_index].observation = observation;
            state.record_step(Phase::ReactAction, format!("Tool not found: {}", action));
            return Ok((state, Next::Continue));
        }

        let validated = match validate_tool_args(&action, &action_input) {
            Ok(v) => v,
            Err(e) => {
                state.react_steps[step_index].observation =
                    format!("Error: Invalid arguments for {}: {}", action, e);
                state.record_step(Phase::ReactAction, format!("Invalid arguments: {}", e));
                return Ok((state, Next::Continue));
            }
        };

        let result = self.ctx.invoker.call(&action, validated).await;

        let observation = if result.success {
            let observation = render_observation(&result.data);
            if let Some(ref data) = result.data {
                state.data.record_tool_data(&action, data);
            }
            state
                .observations
                .push(format!("{}: Retrieved successfully", action));
            state.record_step_with_keys(
                Phase::ReactAction,
                format!("Tool {} executed successfully", action),
                Some(vec![action.clone()]),
            );
            observation
        } else {
            let observation = format!("Error: {}", result.error);
            state.data.tool_errors.push(crate::state::ToolError {
                tool: action.clone(),
                error: result.error.clone(),
            });
            state
                .observations
                .push(format!("{}: Error - {}", action, result.error));
            state.record_step(
                Phase::ReactAction,
                format!("Tool {} failed: {}", action, result.error),
            );
            observation
        };
        state.tool_results.insert(action.clone(), result);
        state.react_steps[step_index].observation = observation;

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::phases::testutil;
    use crate::tool_source::MockToolSource;

    fn react_state() -> AgentRunState {
        AgentRunState::new("what is the bottleneck?", None)
    }

    fn state_with_step(action: &str, input: Value) -> AgentRunState {
        let mut state = react_state();
        state.react_steps.push(ReActStep {
            iteration: 1,
            thought: "t".into(),
            action: action.into(),
            action_input: input,
            observation: String::new(),
        });
        state.react_iteration = 1;
        state
    }

    /// **Scenario**: Reasoning appends a parsed step and bumps the iteration.
    #[tokio::test]
    async fn reasoning_appends_step() {
        let node = ReasonNode::new(testutil::context(MockLlm::always(
            "Thought: check the bottleneck\nAction: find_bottleneck\nAction Input: {}",
        )));
        let (state, _) = node.run(react_state()).await.unwrap();
        assert_eq!(state.react_iteration, 1);
        assert_eq!(state.react_steps.len(), 1);
        assert_eq!(state.react_steps[0].action, "find_bottleneck");
        assert_eq!(state.react_steps[0].observation, "");
    }

    /// **Scenario**: Malformed reasoning output still advances the loop with a
    /// raw-marker step (never aborts).
    #[tokio::test]
    async fn malformed_reasoning_still_advances() {
        let node = ReasonNode::new(testutil::context(MockLlm::always(
            "I think everything is probably fine.",
        )));
        let (state, _) = node.run(react_state()).await.unwrap();
        assert_eq!(state.react_steps.len(), 1);
        assert_eq!(state.react_steps[0].action, "");
        assert!(state.react_steps[0].action_input["raw"].is_string());
    }

    /// **Scenario**: Entering reasoning with the budget spent produces no step,
    /// keeping react_iteration <= react_max_iterations at all times.
    #[tokio::test]
    async fn exhausted_budget_produces_no_step() {
        let node = ReasonNode::new(testutil::context(MockLlm::always("x")));
        let mut state = react_state().with_react_max_iterations(0);
        state.react_iteration = 0;
        let (state, _) = node.run(state).await.unwrap();
        assert!(state.react_steps.is_empty());
        assert_eq!(state.react_iteration, 0);
    }

    /// **Scenario**: "finish" records the Final Answer observation and calls no tool.
    #[tokio::test]
    async fn finish_records_final_answer() {
        let node = ActNode::new(testutil::context(MockLlm::always("unused")));
        let state = state_with_step("finish", json!({"answer": "ST003 is the bottleneck"}));
        let (state, _) = node.run(state).await.unwrap();
        assert_eq!(
            state.react_steps[0].observation,
            "Final Answer: ST003 is the bottleneck"
        );
        assert!(state.tool_results.is_empty());
    }

    /// **Scenario**: An unregistered tool yields an error observation listing
    /// valid tools, without contacting the invoker.
    #[tokio::test]
    async fn unknown_tool_observation_lists_valid_tools() {
        let node = ActNode::new(testutil::context(MockLlm::always("unused")));
        let state = state_with_step("open_pod_bay_doors", json!({}));
        let (state, _) = node.run(state).await.unwrap();
        let obs = &state.react_steps[0].observation;
        assert!(obs.starts_with("Error: Tool 'open_pod_bay_doors' not found"));
        assert!(obs.contains("find_bottleneck"));
        assert!(state.tool_results.is_empty());
    }

    /// **Scenario**: Invalid arguments yield an error observation and no call.
    #[tokio::test]
    async fn invalid_arguments_observation() {
        let node = ActNode::new(testutil::context(MockLlm::always("unused")));
        let state = state_with_step("get_station_status", json!({}));
        let (state, _) = node.run(state).await.unwrap();
        assert!(state.react_steps[0]
            .observation
            .starts_with("Error: Invalid arguments for get_station_status"));
        assert!(state.tool_results.is_empty());
    }

    /// **Scenario**: A successful call records tool_results, mirrors legacy
    /// aliases, and appends an outcome line.
    #[tokio::test]
    async fn successful_call_mirrors_aliases() {
        let node = ActNode::new(testutil::context(MockLlm::always("unused")));
        let state = state_with_step("get_production_metrics", json!({}));
        let (state, _) = node.run(state).await.unwrap();
        let result = &state.tool_results["get_production_metrics"];
        assert!(result.success);
        assert!(state.data.metrics.is_some());
        assert!(state.data.tools.contains_key("get_production_metrics"));
        assert_eq!(
            state.observations,
            vec!["get_production_metrics: Retrieved successfully"]
        );
        assert!(state.react_steps[0].observation.contains("units_produced"));
    }

    /// **Scenario**: A failing tool records a failed ToolResult and a
    /// tool_errors entry; the observation starts with "Error:".
    #[tokio::test]
    async fn failing_tool_records_error() {
        let tools = MockToolSource::with_demo_tools().with_failure(
            "find_bottleneck",
            crate::tool_source::ToolSourceError::Transport("backend down".into()),
        );
        let node = ActNode::new(testutil::context_with_tools(MockLlm::always("unused"), tools));
        let state = state_with_step("find_bottleneck", json!({}));
        let (state, _) = node.run(state).await.unwrap();
        let result = &state.tool_results["find_bottleneck"];
        assert!(!result.success);
        assert_eq!(state.data.tool_errors.len(), 1);
        assert!(state.react_steps[0].observation.starts_with("Error:"));
    }

    /// **Scenario**: Case variants of finish are honored ("Finish", "FINISH").
    #[tokio::test]
    async fn finish_case_insensitive() {
        let node = ActNode::new(testutil::context(MockLlm::always("unused")));
        let state = state_with_step("FINISH", json!({"answer": "done"}));
        let (state, _) = node.run(state).await.unwrap();
        assert!(state.react_steps[0].observation.starts_with("Final Answer:"));
    }
}
