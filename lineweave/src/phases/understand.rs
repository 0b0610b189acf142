//! Understanding phase: intent, entities, and the live-data decision.
//!
//! The fallback heuristic must stay behaviorally identical: greetings never
//! need live data; anything longer than 10 characters does.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::parse::extract_json_object;
use crate::prompts::build_understanding_messages;
use crate::state::{AgentRunState, IntentAnalysis, Phase, ValidationStatus};

use super::context::{PhaseContext, PhaseOutcome};
use super::NODE_UNDERSTAND;

const UNDERSTANDING_MAX_TOKENS: u32 = 400;

const GREETING_KEYWORDS: &[&str] = &["hi", "hello", "hey", "good morning", "good afternoon"];

/// The exact fallback heuristic: greeting-keyword substring match sets
/// `requires_live_data = false`; otherwise any question longer than 10
/// characters is assumed to need live data.
pub fn heuristic_intent(question: &str) -> IntentAnalysis {
    let q_lower = question.to_lowercase();
    let is_greeting = GREETING_KEYWORDS.iter().any(|g| q_lower.contains(g));
    IntentAnalysis {
        primary_intent: if is_greeting {
            "Greeting".to_string()
        } else {
            "Production inquiry".to_string()
        },
        entities: vec![],
        constraints: vec![],
        requires_live_data: !is_greeting && question.chars().count() > 10,
        confidence: 0.7,
        summary: question.to_string(),
    }
}

/// Interprets the analyzer's reply; failures use the heuristic.
pub(crate) fn interpret_understanding_reply(
    question: &str,
    reply: Result<String, String>,
) -> PhaseOutcome<IntentAnalysis> {
    let parse = |text: String| -> Result<IntentAnalysis, String> {
        let map = extract_json_object(&text).map_err(|e| e.to_string())?;
        serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| e.to_string())
    };
    match reply {
        Ok(text) => match parse(text) {
            Ok(intent) => PhaseOutcome::ok(intent),
            Err(e) => PhaseOutcome::degraded(heuristic_intent(question), e),
        },
        Err(call_err) => PhaseOutcome::degraded(heuristic_intent(question), call_err),
    }
}

/// Phase node: analyze intent (skipped upstream when input is invalid).
pub struct UnderstandNode {
    ctx: Arc<PhaseContext>,
}

impl UnderstandNode {
    pub fn new(ctx: Arc<PhaseContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Node<AgentRunState> for UnderstandNode {
    fn id(&self) -> &str {
        NODE_UNDERSTAND
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        state.record_step(Phase::Understanding, "Analyzing intent");

        // The router already short-circuits invalid input; keep the guard so
        // the node is safe if wired differently.
        let invalid = state
            .input_validation
            .as_ref()
            .map(|v| v.status == ValidationStatus::Invalid)
            .unwrap_or(false);
        if invalid {
            let reason = state
                .input_validation
                .as_ref()
                .map(|v| v.reason.clone())
                .unwrap_or_default();
            state.intent = Some(IntentAnalysis {
                primary_intent: "Invalid request".into(),
                entities: vec![],
                constraints: vec![],
                requires_live_data: false,
                confidence: 0.0,
                summary: reason,
            });
            return Ok((state, Next::Continue));
        }

        let memory_context = self.ctx.memory_block(&state.thread_id).await;
        let messages =
            build_understanding_messages(&self.ctx.prompts, &state.question, &memory_context);
        let reply = self
            .ctx
            .complete(&messages, UNDERSTANDING_MAX_TOKENS)
            .await?;

        let outcome = interpret_understanding_reply(&state.question, reply);
        let message = if outcome.degraded {
            "Intent analyzed with fallback".to_string()
        } else {
            let preview: String = outcome.value.primary_intent.chars().take(50).collect();
            format!("Intent: {}", preview)
        };
        state.intent = Some(outcome.value);
        state.record_step(Phase::Understanding, message);

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::phases::testutil;

    /// **Scenario**: "hi" is a greeting — no live data required.
    #[test]
    fn heuristic_greeting_needs_no_live_data() {
        let intent = heuristic_intent("hi");
        assert_eq!(intent.primary_intent, "Greeting");
        assert!(!intent.requires_live_data);
        assert_eq!(intent.confidence, 0.7);
    }

    /// **Scenario**: A long non-greeting question defaults to live data.
    #[test]
    fn heuristic_long_question_needs_live_data() {
        let intent = heuristic_intent("what is the current throughput of the packaging area?");
        assert_eq!(intent.primary_intent, "Production inquiry");
        assert!(intent.requires_live_data);
    }

    /// **Scenario**: Short non-greeting text (≤ 10 chars) does not trigger
    /// live data.
    #[test]
    fn heuristic_short_question_needs_no_live_data() {
        assert!(!heuristic_intent("status?").requires_live_data);
    }

    /// **Scenario**: A well-formed reply parses, including entities using the
    /// "type" key.
    #[test]
    fn well_formed_reply_parses() {
        let reply = r#"{
            "primary_intent": "Station status check",
            "entities": [{"type": "station", "value": "ST003"}],
            "constraints": [],
            "requires_live_data": true,
            "confidence": 0.92,
            "summary": "status of ST003"
        }"#;
        let outcome = interpret_understanding_reply("q", Ok(reply.into()));
        assert!(!outcome.degraded);
        assert_eq!(outcome.value.entities[0].kind, "station");
        assert!(outcome.value.requires_live_data);
    }

    /// **Scenario**: A reply missing required keys falls back to the heuristic.
    #[test]
    fn sparse_reply_falls_back_to_heuristic() {
        let outcome =
            interpret_understanding_reply("tell me about station five please", Ok(r#"{"error": "no idea"}"#.into()));
        assert!(outcome.degraded);
        assert_eq!(outcome.value.primary_intent, "Production inquiry");
        assert!(outcome.value.requires_live_data);
    }

    /// **Scenario**: A call failure falls back to the heuristic too.
    #[test]
    fn call_failure_falls_back_to_heuristic() {
        let outcome = interpret_understanding_reply("hello there", Err("timeout".into()));
        assert!(outcome.degraded);
        assert!(!outcome.value.requires_live_data);
    }

    /// **Scenario**: The node stores intent and records two timeline entries.
    #[tokio::test]
    async fn node_stores_intent() {
        let node = UnderstandNode::new(testutil::context(MockLlm::always(
            r#"{"primary_intent": "Metrics", "requires_live_data": true}"#,
        )));
        let state = AgentRunState::new("how many units today?", None);
        let (state, _) = node.run(state).await.unwrap();
        let intent = state.intent.unwrap();
        assert_eq!(intent.primary_intent, "Metrics");
        assert!(intent.requires_live_data);
        assert_eq!(intent.confidence, 0.7, "confidence defaults when absent");
        assert_eq!(state.timeline.len(), 2);
    }
}
