//! Synthesizer: collapse the run state into the final answer prompt.
//!
//! Two mutually exclusive templates: "direct" when the run produced no tool
//! data at all, "data-driven" otherwise. The data-driven user payload is a
//! JSON context with tool results, observations, validation findings, tool
//! errors, and — when the ReAct loop ran — the reasoning trace with each
//! observation truncated to bound prompt size. The pipeline never surfaces
//! an empty answer: blank output is replaced by a fixed friendly fallback.

use serde_json::json;

use crate::message::Message;
use crate::prompts::{with_memory_context, PromptSet};
use crate::state::AgentRunState;

/// Token budget for the synthesis completion.
pub const SYNTHESIS_MAX_TOKENS: u32 = 400;

/// Replacement for blank model output.
pub const FALLBACK_ANSWER: &str = "Happy to help. Could you share a bit more detail?";

/// Per-observation character bound inside the ReAct trace.
const OBSERVATION_TRUNCATE_CHARS: usize = 500;

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// Whether the run gathered any tool data at all.
fn has_tool_data(state: &AgentRunState) -> bool {
    !state.tool_plan.is_empty() || !state.tool_results.is_empty() || !state.data.tools.is_empty()
}

/// Builds the synthesis message list for a completed pipeline state.
pub fn build_synthesis_messages(
    prompts: &PromptSet,
    state: &AgentRunState,
    memory_context: &str,
) -> Vec<Message> {
    if !has_tool_data(state) {
        return vec![
            Message::system(with_memory_context(&prompts.synthesis_direct, memory_context)),
            Message::user(state.question.clone()),
        ];
    }

    let (intent_summary, primary_intent) = state
        .intent
        .as_ref()
        .map(|i| (i.summary.clone(), i.primary_intent.clone()))
        .unwrap_or_default();
    let (confidence, warnings, missing_info) = state
        .output_validation
        .as_ref()
        .map(|v| (v.confidence, v.warnings.clone(), v.missing_info.clone()))
        .unwrap_or((1.0, vec![], vec![]));

    let mut context = json!({
        "question": state.question,
        "intent_summary": intent_summary,
        "primary_intent": primary_intent,
        "tool_results": state.tool_results,
        "observations": state.observations,
        "validation": {
            "confidence": confidence,
            "warnings": warnings,
            "missing_info": missing_info,
        },
        "errors": state.data.tool_errors,
    });

    if !state.react_steps.is_empty() {
        let trace: Vec<serde_json::Value> = state
            .react_steps
            .iter()
            .map(|s| {
                json!({
                    "iteration": s.iteration,
                    "thought": s.thought,
                    "action": s.action,
                    "observation": truncate_chars(&s.observation, OBSERVATION_TRUNCATE_CHARS),
                })
            })
            .collect();
        context["react_trace"] = json!(trace);
    }

    let user_content = serde_json::to_string_pretty(&context)
        .unwrap_or_else(|_| state.question.clone());

    vec![
        Message::system(with_memory_context(&prompts.synthesis_data, memory_context)),
        Message::user(user_content),
    ]
}

/// Applies the never-empty-answer rule.
pub fn ensure_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_ANSWER.to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{PromptSet, StaticPromptSource, REQUIRED_PROMPTS};
    use crate::state::{OutputValidation, ReActStep, ToolResult};
    use serde_json::Value;

    fn prompts() -> PromptSet {
        PromptSet::resolve(&StaticPromptSource::from_pairs(
            REQUIRED_PROMPTS.iter().map(|n| (*n, format!("<{}>", n))),
        ))
        .unwrap()
    }

    /// **Scenario**: With no tool data at all, the direct template is used and
    /// the user content is the raw question.
    #[test]
    fn direct_template_for_no_tool_data() {
        let state = AgentRunState::new("hi", None);
        let msgs = build_synthesis_messages(&prompts(), &state, "");
        assert!(msgs[0].content().contains("<synthesis-direct-system>"));
        assert_eq!(msgs[1].content(), "hi");
    }

    /// **Scenario**: With tool results, the data template carries a JSON
    /// context including validation findings and errors.
    #[test]
    fn data_template_carries_context() {
        let mut state = AgentRunState::new("metrics?", None);
        state.tool_results.insert(
            "get_production_metrics".into(),
            ToolResult {
                tool_name: "get_production_metrics".into(),
                success: true,
                data: Some(serde_json::json!({"units_produced": 10})),
                error: String::new(),
                execution_time_ms: 3.0,
            },
        );
        state.observations.push("get_production_metrics: Retrieved successfully".into());
        state.output_validation = Some(OutputValidation {
            is_complete: true,
            is_accurate: true,
            is_safe: true,
            confidence: 1.0,
            missing_info: vec![],
            warnings: vec!["late shift data pending".into()],
        });
        let msgs = build_synthesis_messages(&prompts(), &state, "");
        assert!(msgs[0].content().contains("<synthesis-data-system>"));
        let context: Value = serde_json::from_str(msgs[1].content()).unwrap();
        assert_eq!(context["question"], "metrics?");
        assert_eq!(context["validation"]["warnings"][0], "late shift data pending");
        assert!(context.get("react_trace").is_none());
    }

    /// **Scenario**: ReAct runs include the trace with observations truncated
    /// to 500 characters.
    #[test]
    fn react_trace_truncates_observations() {
        let mut state = AgentRunState::new("q", None);
        state.tool_results.insert(
            "get_alarm_log".into(),
            ToolResult {
                tool_name: "get_alarm_log".into(),
                success: true,
                data: Some(serde_json::json!([])),
                error: String::new(),
                execution_time_ms: 2.0,
            },
        );
        state.react_steps.push(ReActStep {
            iteration: 1,
            thought: "look at alarms".into(),
            action: "get_alarm_log".into(),
            action_input: serde_json::json!({}),
            observation: "x".repeat(2000),
        });
        let msgs = build_synthesis_messages(&prompts(), &state, "");
        let context: Value = serde_json::from_str(msgs[1].content()).unwrap();
        let obs = context["react_trace"][0]["observation"].as_str().unwrap();
        assert_eq!(obs.chars().count(), 500);
    }

    /// **Scenario**: Memory context is appended to the system prompt.
    #[test]
    fn memory_context_included() {
        let state = AgentRunState::new("hi", None);
        let msgs = build_synthesis_messages(&prompts(), &state, "Summary: repeat visitor");
        assert!(msgs[0].content().contains("repeat visitor"));
    }

    /// **Scenario**: Blank output becomes the fixed fallback; non-blank passes through.
    #[test]
    fn ensure_answer_never_empty() {
        assert_eq!(ensure_answer("   "), FALLBACK_ANSWER);
        assert_eq!(ensure_answer(""), FALLBACK_ANSWER);
        assert_eq!(ensure_answer("All good."), "All good.");
    }
}
