//! The fixed phase pipeline: nodes, routing, and the per-run context.
//!
//! One [`Node<AgentRunState>`](crate::graph::Node) per phase, wired by
//! [`build_agent_graph`] with the three routing decisions as conditional
//! edges:
//!
//! ```text
//! START → validate_input ──(invalid)───────────────────────→ finalize → END
//!              │
//!              ▼
//!       understand_intent → create_plan ─┬→ react_reasoning → react_action
//!                                        │        ▲                │ (loop until
//!                                        │        └────────────────┤  cap/finish)
//!                                        ├→ execute_plan ──────────┤
//!                                        └→ (direct) ──────────────┤
//!                                                                  ▼
//!                                           validate_output → finalize → END
//! ```
//!
//! Every LLM and tool failure is converted at the phase boundary into a
//! degraded [`PhaseOutcome`] plus a timeline entry; the only error that
//! escapes a phase is total provider unavailability.

mod context;
mod execute;
mod finalize;
mod plan;
mod react;
mod understand;
mod validate_input;
mod validate_output;

pub use context::{PhaseContext, PhaseOutcome};
pub use execute::ExecutePlanNode;
pub use finalize::FinalizeNode;
pub use plan::PlanNode;
pub use react::{ActNode, ReasonNode};
pub use understand::{heuristic_intent, UnderstandNode};
pub use validate_input::ValidateInputNode;
pub use validate_output::{score_output, OutputValidationNode};

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::{CompilationError, CompiledStateGraph, StateGraph, END, START};
use crate::state::{AgentRunState, ValidationStatus};

/// Node ids, used in wiring and by the routers.
pub const NODE_VALIDATE_INPUT: &str = "validate_input";
pub const NODE_UNDERSTAND: &str = "understand_intent";
pub const NODE_PLAN: &str = "create_plan";
pub const NODE_REACT_REASONING: &str = "react_reasoning";
pub const NODE_REACT_ACTION: &str = "react_action";
pub const NODE_EXECUTE_PLAN: &str = "execute_plan";
pub const NODE_VALIDATE_OUTPUT: &str = "validate_output";
pub const NODE_FINALIZE: &str = "finalize";

/// After input validation: invalid input short-circuits to finalize.
pub fn after_validation_route(state: &AgentRunState) -> String {
    let invalid = state
        .input_validation
        .as_ref()
        .map(|v| v.status == ValidationStatus::Invalid)
        .unwrap_or(false);
    if invalid {
        NODE_FINALIZE.to_string()
    } else {
        NODE_UNDERSTAND.to_string()
    }
}

/// After planning: choose the ReAct loop, the legacy sequential executor, or
/// the direct path (which still passes through output validation).
pub fn execution_route(state: &AgentRunState) -> String {
    if state.react_enabled && state.requires_live_data() {
        return NODE_REACT_REASONING.to_string();
    }
    if !state.tool_plan.is_empty() {
        return NODE_EXECUTE_PLAN.to_string();
    }
    NODE_VALIDATE_OUTPUT.to_string()
}

/// After a ReAct action: loop back to reasoning unless the iteration budget
/// is spent or the last action was "finish". This cap is the runaway-loop
/// guard and is enforced here, independent of model behavior.
pub fn react_continue_route(state: &AgentRunState) -> String {
    if state.react_iteration >= state.react_max_iterations {
        return NODE_VALIDATE_OUTPUT.to_string();
    }
    if let Some(last) = state.react_steps.last() {
        if last.action.trim().eq_ignore_ascii_case("finish") {
            return NODE_VALIDATE_OUTPUT.to_string();
        }
    }
    NODE_REACT_REASONING.to_string()
}

fn identity_path_map(targets: &[&str]) -> HashMap<String, String> {
    targets
        .iter()
        .map(|t| (t.to_string(), t.to_string()))
        .collect()
}

/// Builds the compiled phase graph over a shared per-run context.
pub fn build_agent_graph(
    ctx: Arc<PhaseContext>,
) -> Result<CompiledStateGraph<AgentRunState>, CompilationError> {
    let mut graph = StateGraph::<AgentRunState>::new();
    graph
        .add_node(NODE_VALIDATE_INPUT, Arc::new(ValidateInputNode::new(ctx.clone())))
        .add_node(NODE_UNDERSTAND, Arc::new(UnderstandNode::new(ctx.clone())))
        .add_node(NODE_PLAN, Arc::new(PlanNode::new(ctx.clone())))
        .add_node(NODE_REACT_REASONING, Arc::new(ReasonNode::new(ctx.clone())))
        .add_node(NODE_REACT_ACTION, Arc::new(ActNode::new(ctx.clone())))
        .add_node(NODE_EXECUTE_PLAN, Arc::new(ExecutePlanNode::new(ctx)))
        .add_node(NODE_VALIDATE_OUTPUT, Arc::new(OutputValidationNode::new()))
        .add_node(NODE_FINALIZE, Arc::new(FinalizeNode::new()));

    graph
        .add_edge(START, NODE_VALIDATE_INPUT)
        .add_edge(NODE_UNDERSTAND, NODE_PLAN)
        .add_edge(NODE_REACT_REASONING, NODE_REACT_ACTION)
        .add_edge(NODE_EXECUTE_PLAN, NODE_VALIDATE_OUTPUT)
        .add_edge(NODE_VALIDATE_OUTPUT, NODE_FINALIZE)
        .add_edge(NODE_FINALIZE, END);

    graph.add_conditional_edges(
        NODE_VALIDATE_INPUT,
        Arc::new(after_validation_route),
        Some(identity_path_map(&[NODE_UNDERSTAND, NODE_FINALIZE])),
    );
    graph.add_conditional_edges(
        NODE_PLAN,
        Arc::new(execution_route),
        Some(identity_path_map(&[
            NODE_REACT_REASONING,
            NODE_EXECUTE_PLAN,
            NODE_VALIDATE_OUTPUT,
        ])),
    );
    graph.add_conditional_edges(
        NODE_REACT_ACTION,
        Arc::new(react_continue_route),
        Some(identity_path_map(&[
            NODE_REACT_REASONING,
            NODE_VALIDATE_OUTPUT,
        ])),
    );

    graph.compile()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{IntentAnalysis, InputValidation, ReActStep};

    fn state_with_intent(requires_live_data: bool) -> AgentRunState {
        let mut state = AgentRunState::new("q", None);
        state.intent = Some(IntentAnalysis {
            primary_intent: "x".into(),
            entities: vec![],
            constraints: vec![],
            requires_live_data,
            confidence: 0.9,
            summary: "x".into(),
        });
        state
    }

    /// **Scenario**: Invalid input routes straight to finalize; anything else
    /// continues to understanding.
    #[test]
    fn validation_router_short_circuits_invalid() {
        let mut state = AgentRunState::new("q", None);
        assert_eq!(after_validation_route(&state), NODE_UNDERSTAND);
        state.input_validation = Some(InputValidation {
            status: ValidationStatus::Invalid,
            ..InputValidation::fail_open("nope")
        });
        assert_eq!(after_validation_route(&state), NODE_FINALIZE);
    }

    /// **Scenario**: The execution router picks ReAct when enabled + live data,
    /// the sequential executor when a plan exists, else output validation.
    #[test]
    fn execution_router_selects_path() {
        let state = state_with_intent(true);
        assert_eq!(execution_route(&state), NODE_REACT_REASONING);

        let mut state = state_with_intent(true).with_react_enabled(false);
        state.tool_plan.push(crate::state::ToolPlanItem {
            name: "get_production_metrics".into(),
            args: serde_json::json!({}),
            purpose: String::new(),
            priority: 1,
        });
        assert_eq!(execution_route(&state), NODE_EXECUTE_PLAN);

        let state = state_with_intent(false);
        assert_eq!(execution_route(&state), NODE_VALIDATE_OUTPUT);
    }

    /// **Scenario**: The ReAct router exits on the iteration cap or on a
    /// case-insensitive "finish"; otherwise it loops.
    #[test]
    fn react_router_exits_on_cap_or_finish() {
        let mut state = state_with_intent(true);
        state.react_iteration = 1;
        state.react_steps.push(ReActStep {
            iteration: 1,
            thought: String::new(),
            action: "get_production_metrics".into(),
            action_input: serde_json::json!({}),
            observation: "ok".into(),
        });
        assert_eq!(react_continue_route(&state), NODE_REACT_REASONING);

        state.react_iteration = state.react_max_iterations;
        assert_eq!(react_continue_route(&state), NODE_VALIDATE_OUTPUT);

        state.react_iteration = 2;
        state.react_steps.push(ReActStep {
            iteration: 2,
            thought: String::new(),
            action: "Finish".into(),
            action_input: serde_json::json!({"answer": "done"}),
            observation: String::new(),
        });
        assert_eq!(react_continue_route(&state), NODE_VALIDATE_OUTPUT);
    }
}
