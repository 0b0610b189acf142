//! Message-list builders for each phase prompt.
//!
//! Every builder takes the resolved [`PromptSet`](super::PromptSet) and the
//! rendered memory context; phase prompts expect strict JSON back, the ReAct
//! prompt expects the labelled-section grammar.

use serde_json::json;

use crate::message::Message;
use crate::state::{IntentAnalysis, ReActStep};
use crate::tool_source::ToolSpec;

use super::PromptSet;

/// Appends the conversation context block to a system prompt when non-empty.
pub fn with_memory_context(system: &str, memory_context: &str) -> String {
    if memory_context.is_empty() {
        system.to_string()
    } else {
        format!("{}\n\nConversation context:\n{}", system, memory_context)
    }
}

/// Input-validation prompt: system + raw question.
pub fn build_input_validation_messages(
    set: &PromptSet,
    question: &str,
    memory_context: &str,
) -> Vec<Message> {
    vec![
        Message::system(with_memory_context(&set.input_validation, memory_context)),
        Message::user(question),
    ]
}

/// Understanding prompt: system + raw question.
pub fn build_understanding_messages(
    set: &PromptSet,
    question: &str,
    memory_context: &str,
) -> Vec<Message> {
    vec![
        Message::system(with_memory_context(&set.understanding, memory_context)),
        Message::user(question),
    ]
}

/// Planning prompt: the user content carries question + intent analysis as JSON.
pub fn build_planning_messages(
    set: &PromptSet,
    question: &str,
    intent: &IntentAnalysis,
    memory_context: &str,
) -> Vec<Message> {
    let user_content = serde_json::to_string_pretty(&json!({
        "question": question,
        "intent_analysis": intent,
    }))
    .unwrap_or_else(|_| question.to_string());
    vec![
        Message::system(with_memory_context(&set.planning, memory_context)),
        Message::user(user_content),
    ]
}

/// Renders the scratchpad: the serialized transcript of prior ReAct steps
/// injected into the next reasoning prompt.
pub fn format_react_scratchpad(steps: &[ReActStep]) -> String {
    let mut out = String::new();
    for step in steps {
        out.push_str(&format!(
            "Thought: {}\nAction: {}\nAction Input: {}\nObservation: {}\n\n",
            step.thought, step.action, step.action_input, step.observation
        ));
    }
    out.trim_end().to_string()
}

fn render_tool_lines(tools: &[ToolSpec]) -> String {
    tools
        .iter()
        .map(|t| {
            format!(
                "- {}: {} (args schema: {})",
                t.name,
                t.description.as_deref().unwrap_or("No description"),
                t.input_schema
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// ReAct reasoning prompt: question, the available-tools list (name,
/// description, argument schema), and the scratchpad of prior steps.
pub fn build_react_reasoning_messages(
    set: &PromptSet,
    question: &str,
    tools: &[ToolSpec],
    scratchpad: &str,
    memory_context: &str,
) -> Vec<Message> {
    let steps_block = if scratchpad.is_empty() {
        "(no previous steps)".to_string()
    } else {
        scratchpad.to_string()
    };
    let user_content = format!(
        "Question: {}\n\nAvailable tools:\n{}\n\nPrevious steps:\n{}",
        question,
        render_tool_lines(tools),
        steps_block
    );
    vec![
        Message::system(with_memory_context(&set.react_reasoning, memory_context)),
        Message::user(user_content),
    ]
}

/// Summary-refresh prompt: prior summary plus the recent turns to condense.
pub fn build_summary_messages(
    set: &PromptSet,
    prior_summary: Option<&str>,
    recent_turns: &[(String, String)],
) -> Vec<Message> {
    let conversation_text = recent_turns
        .iter()
        .map(|(role, content)| format!("{}: {}", role, content))
        .collect::<Vec<_>>()
        .join("\n");
    vec![
        Message::system(set.summary.clone()),
        Message::user(format!(
            "Existing summary:\n{}\n\nRecent turns:\n{}",
            prior_summary.filter(|s| !s.is_empty()).unwrap_or("None"),
            conversation_text
        )),
    ]
}
