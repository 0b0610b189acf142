//! Integration tests: the streaming surface of the agent.
//!
//! The event stream is a single-producer, ordered, finite sequence: phase
//! steps, then AnswerStart / chunks / AnswerEnd, terminated by exactly one
//! Final event carrying the full state.

use std::sync::Arc;

use tokio_stream::StreamExt;

use lineweave::{
    AgentConfig, AgentEvent, InMemoryConversationStore, LineAgent, MockLlm, MockToolSource,
    StaticPromptSource, REQUIRED_PROMPTS,
};

fn prompt_source() -> StaticPromptSource {
    StaticPromptSource::from_pairs(REQUIRED_PROMPTS.iter().map(|n| (*n, format!("[{}]", n))))
}

fn agent(llm: MockLlm) -> LineAgent {
    LineAgent::new(
        Arc::new(llm),
        Arc::new(MockToolSource::with_demo_tools()),
        Arc::new(InMemoryConversationStore::new()),
        &prompt_source(),
        AgentConfig::default(),
    )
    .expect("agent builds")
}

/// Scenario: the stream emits steps, then the answer section, then exactly
/// one terminal Final event — and the chunks concatenate to the answer.
#[tokio::test]
async fn stream_is_ordered_and_finite() {
    let llm = MockLlm::with_replies([
        r#"{"status": "valid", "is_safe": true, "is_clear": true, "is_relevant": true, "reason": "ok"}"#,
        r#"{"primary_intent": "Greeting", "entities": [], "constraints": [], "requires_live_data": false, "confidence": 0.9, "summary": "greeting"}"#,
        "Hello! Ask me about your production line.",
    ])
    .with_stream_by_char();

    let events: Vec<AgentEvent> = agent(llm).stream("hi", None).collect().await;

    // Terminal event is Final, exactly once, at the end.
    assert!(matches!(events.last(), Some(AgentEvent::Final { .. })));
    let final_count = events
        .iter()
        .filter(|e| matches!(e, AgentEvent::Final { .. }))
        .count();
    assert_eq!(final_count, 1);

    // Section order: all Steps strictly before AnswerStart, chunks between
    // AnswerStart and AnswerEnd.
    let start_idx = events
        .iter()
        .position(|e| matches!(e, AgentEvent::AnswerStart))
        .expect("AnswerStart present");
    let end_idx = events
        .iter()
        .position(|e| matches!(e, AgentEvent::AnswerEnd))
        .expect("AnswerEnd present");
    assert!(start_idx < end_idx);
    for (i, event) in events.iter().enumerate() {
        match event {
            AgentEvent::Step { .. } => assert!(i < start_idx, "step after answer start"),
            AgentEvent::AnswerChunk { .. } => {
                assert!(i > start_idx && i < end_idx, "chunk outside answer section")
            }
            _ => {}
        }
    }

    // Chunks concatenate to the final answer.
    let collected: String = events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::AnswerChunk { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    let AgentEvent::Final { state } = events.last().unwrap() else {
        unreachable!()
    };
    assert_eq!(collected, "Hello! Ask me about your production line.");
    assert_eq!(state.answer(), Some(collected.as_str()));
    assert_eq!(state.timeline.last().unwrap().message, "Response complete");
    assert!(!state.timeline.is_empty());
}

/// Scenario: steps cover every phase the run went through, in pipeline order.
#[tokio::test]
async fn stream_steps_cover_phases_in_order() {
    let llm = MockLlm::with_replies([
        r#"{"status": "valid", "is_safe": true, "is_clear": true, "is_relevant": true, "reason": "ok"}"#,
        r#"{"primary_intent": "Inquiry", "entities": [], "constraints": [], "requires_live_data": true, "confidence": 0.9, "summary": "inquiry"}"#,
        r#"{"tool_plan": [], "execution_strategy": "sequential"}"#,
        "Thought: metrics first\nAction: get_production_metrics\nAction Input: {}",
        "Thought: done\nAction: finish\nAction Input: {\"answer\": \"all good\"}",
        "All good on the line.",
    ]);

    let events: Vec<AgentEvent> = agent(llm)
        .stream("how is the line doing?", None)
        .collect()
        .await;

    let step_messages: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::Step { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect();

    assert!(step_messages.iter().any(|m| m == "Validating input"));
    assert!(step_messages.iter().any(|m| m.contains("ReAct iteration 1/5")));
    assert!(step_messages.iter().any(|m| m == "Agent decided to finish"));
    assert!(step_messages.iter().any(|m| m.contains("ReAct completed")));
    assert!(step_messages.iter().any(|m| m == "Preparing response"));
    assert!(matches!(events.last(), Some(AgentEvent::Final { .. })));
}

/// Scenario: a synthesis call failure streams the degraded answer text and
/// still terminates with Final ("Response failed" sealed in the timeline).
#[tokio::test]
async fn stream_synthesis_failure_still_finishes() {
    let llm = MockLlm::with_replies([
        r#"{"status": "valid", "is_safe": true, "is_clear": true, "is_relevant": true, "reason": "ok"}"#,
        r#"{"primary_intent": "Greeting", "entities": [], "constraints": [], "requires_live_data": false, "confidence": 0.9, "summary": "greeting"}"#,
    ])
    .then_failure("upstream 500");

    let events: Vec<AgentEvent> = agent(llm).stream("hi", None).collect().await;

    let AgentEvent::Final { state } = events.last().unwrap() else {
        panic!("stream must end with Final");
    };
    let answer = state.answer().unwrap();
    assert!(answer.starts_with("Unable to generate response"));
    assert_eq!(state.timeline.last().unwrap().message, "Response failed");
    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::AnswerChunk { text } if text.contains("Unable to generate response"))));
}
