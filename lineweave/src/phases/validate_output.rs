//! Output-validation phase: score what the tool work actually produced.
//!
//! Confidence is successful-actions over total-actions. With nothing to
//! count (the direct path, or a loop that went straight to finish) the score
//! is 1.0 — nothing was attempted, so nothing failed. A ReAct run that never
//! reached "finish" is penalized by 0.8 and flagged.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::{AgentRunState, OutputValidation, Phase};

use super::NODE_VALIDATE_OUTPUT;

/// Warning added when the loop exhausted its iterations without finishing.
pub const UNFINISHED_WARNING: &str = "Agent reached max iterations without finishing";

/// Penalty factor applied to confidence when the loop never finished.
const UNFINISHED_PENALTY: f64 = 0.8;

/// Pure scoring over the run state (unit-testable without a pipeline).
pub fn score_output(state: &AgentRunState) -> OutputValidation {
    // Direct path: no plan, no loop — complete by construction.
    if state.tool_plan.is_empty() && state.react_steps.is_empty() {
        return OutputValidation {
            is_complete: true,
            is_accurate: true,
            is_safe: true,
            confidence: 1.0,
            missing_info: vec![],
            warnings: vec![],
        };
    }

    if !state.react_steps.is_empty() {
        let non_finish = || {
            state
                .react_steps
                .iter()
                .filter(|s| !s.action.trim().eq_ignore_ascii_case("finish"))
        };
        let total_actions = non_finish().count();
        let successful_actions = non_finish()
            .filter(|s| !s.observation.is_empty() && !s.observation.starts_with("Error:"))
            .count();
        let finished = state.react_finished();

        let missing_info: Vec<String> = state
            .react_steps
            .iter()
            .filter(|s| s.observation.starts_with("Error:"))
            .map(|s| s.observation.clone())
            .collect();

        let mut warnings = vec![];
        let mut confidence = if total_actions == 0 {
            1.0
        } else {
            successful_actions as f64 / total_actions as f64
        };
        if !finished {
            warnings.push(UNFINISHED_WARNING.to_string());
            confidence *= UNFINISHED_PENALTY;
        }

        return OutputValidation {
            is_complete: missing_info.is_empty() && finished,
            is_accurate: true,
            is_safe: true,
            confidence,
            missing_info,
            warnings,
        };
    }

    // Legacy plan execution: count tool results.
    let total_tools = state.tool_results.len();
    let successful_tools = state.tool_results.values().filter(|r| r.success).count();

    let mut missing_info = vec![];
    let mut warnings = vec![];
    for (name, result) in &state.tool_results {
        if !result.success {
            missing_info.push(format!("{} failed: {}", name, result.error));
        } else if result.data.is_none() {
            warnings.push(format!("{} returned no data", name));
        }
    }

    OutputValidation {
        is_complete: missing_info.is_empty(),
        is_accurate: true,
        is_safe: true,
        confidence: successful_tools as f64 / total_tools.max(1) as f64,
        missing_info,
        warnings,
    }
}

/// Phase node: store the score and describe it in the timeline.
pub struct OutputValidationNode;

impl OutputValidationNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OutputValidationNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node<AgentRunState> for OutputValidationNode {
    fn id(&self) -> &str {
        NODE_VALIDATE_OUTPUT
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        let direct = state.tool_plan.is_empty() && state.react_steps.is_empty();
        let validation = score_output(&state);

        if !direct {
            state.record_step(Phase::OutputValidation, "Validating results");
            let message = if !state.react_steps.is_empty() {
                let non_finish = state
                    .react_steps
                    .iter()
                    .filter(|s| !s.action.trim().eq_ignore_ascii_case("finish"))
                    .count();
                let successful = state
                    .react_steps
                    .iter()
                    .filter(|s| {
                        !s.action.trim().eq_ignore_ascii_case("finish")
                            && !s.observation.is_empty()
                            && !s.observation.starts_with("Error:")
                    })
                    .count();
                if validation.missing_info.is_empty() {
                    format!("ReAct completed ({} steps)", state.react_steps.len())
                } else {
                    format!("Partial data ({}/{} actions)", successful, non_finish)
                }
            } else {
                let successful = state.tool_results.values().filter(|r| r.success).count();
                if validation.missing_info.is_empty() {
                    "Results validated".to_string()
                } else {
                    format!(
                        "Partial data ({}/{} tools)",
                        successful,
                        state.tool_results.len()
                    )
                }
            };
            state.record_step(Phase::OutputValidation, message);
        }

        state.output_validation = Some(validation);
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ReActStep, ToolResult};
    use serde_json::json;

    fn tool_result(name: &str, success: bool, error: &str) -> ToolResult {
        ToolResult {
            tool_name: name.into(),
            success,
            data: success.then(|| json!({"v": 1})),
            error: error.into(),
            execution_time_ms: 1.0,
        }
    }

    fn react_step(action: &str, observation: &str) -> ReActStep {
        ReActStep {
            iteration: 1,
            thought: String::new(),
            action: action.into(),
            action_input: json!({}),
            observation: observation.into(),
        }
    }

    /// **Scenario**: Zero tool calls (direct path) scores exactly 1.0 — no
    /// division error.
    #[test]
    fn direct_path_scores_one() {
        let state = AgentRunState::new("hi", None);
        let v = score_output(&state);
        assert_eq!(v.confidence, 1.0);
        assert!(v.is_complete);
    }

    /// **Scenario**: Legacy mode with 2 successes out of 3 tool calls scores
    /// exactly 2/3.
    #[test]
    fn legacy_two_of_three_is_two_thirds() {
        let mut state = AgentRunState::new("q", None);
        state.tool_plan.push(crate::state::ToolPlanItem {
            name: "a".into(),
            args: json!({}),
            purpose: String::new(),
            priority: 1,
        });
        state
            .tool_results
            .insert("a".into(), tool_result("a", true, ""));
        state
            .tool_results
            .insert("b".into(), tool_result("b", true, ""));
        state
            .tool_results
            .insert("c".into(), tool_result("c", false, "boom"));
        let v = score_output(&state);
        assert_eq!(v.confidence, 2.0 / 3.0);
        assert!(!v.is_complete);
        assert_eq!(v.missing_info, vec!["c failed: boom"]);
    }

    /// **Scenario**: A successful-but-null result warns "returned no data".
    #[test]
    fn legacy_null_data_warns() {
        let mut state = AgentRunState::new("q", None);
        state.tool_plan.push(crate::state::ToolPlanItem {
            name: "a".into(),
            args: json!({}),
            purpose: String::new(),
            priority: 1,
        });
        let mut result = tool_result("a", true, "");
        result.data = None;
        state.tool_results.insert("a".into(), result);
        let v = score_output(&state);
        assert_eq!(v.warnings, vec!["a returned no data"]);
        assert!(v.is_complete);
    }

    /// **Scenario**: A finished ReAct run with one successful action scores 1.0
    /// and is complete.
    #[test]
    fn react_finished_run_scores_one() {
        let mut state = AgentRunState::new("q", None);
        state.react_steps = vec![
            react_step("get_production_metrics", "{\"v\": 1}"),
            react_step("finish", "Final Answer: all good"),
        ];
        let v = score_output(&state);
        assert_eq!(v.confidence, 1.0);
        assert!(v.is_complete);
        assert!(v.warnings.is_empty());
    }

    /// **Scenario**: An unfinished ReAct run is penalized by 0.8 and warned,
    /// and is not complete even without errors.
    #[test]
    fn react_unfinished_penalized() {
        let mut state = AgentRunState::new("q", None);
        state.react_steps = vec![
            react_step("get_production_metrics", "{\"v\": 1}"),
            react_step("find_bottleneck", "{\"v\": 2}"),
        ];
        let v = score_output(&state);
        assert_eq!(v.confidence, 0.8);
        assert_eq!(v.warnings, vec![UNFINISHED_WARNING]);
        assert!(!v.is_complete);
    }

    /// **Scenario**: A loop that only emitted error observations scores 0.0
    /// (1 failure / 1 action, unfinished → 0.0 * 0.8).
    #[test]
    fn react_all_errors_scores_zero() {
        let mut state = AgentRunState::new("q", None);
        state.react_steps = vec![react_step(
            "get_production_metrics",
            "Error: Tool call timed out after 30 seconds",
        )];
        let v = score_output(&state);
        assert_eq!(v.confidence, 0.0);
        assert!(!v.is_complete);
        assert_eq!(v.missing_info.len(), 1);
    }

    /// **Scenario**: A finish-only loop (no tool actions) scores 1.0, not 0.
    #[test]
    fn react_finish_only_scores_one() {
        let mut state = AgentRunState::new("q", None);
        state.react_steps = vec![react_step("finish", "Final Answer: no data needed")];
        let v = score_output(&state);
        assert_eq!(v.confidence, 1.0);
        assert!(v.is_complete);
    }
}
