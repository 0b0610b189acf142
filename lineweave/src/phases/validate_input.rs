//! Input-validation phase: safety / clarity / relevance triage.
//!
//! Fail-open: a user is never blocked because the validator itself failed.
//! Call failures and unparseable replies both fall back to `status: valid`
//! with an explanatory reason.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::parse::extract_json_object;
use crate::prompts::build_input_validation_messages;
use crate::state::{AgentRunState, InputValidation, Phase, ValidationStatus};

use super::context::{PhaseContext, PhaseOutcome};
use super::NODE_VALIDATE_INPUT;

const VALIDATION_MAX_TOKENS: u32 = 300;

/// Interprets the validator's reply; any failure falls back open.
pub(crate) fn interpret_validation_reply(
    reply: Result<String, String>,
) -> PhaseOutcome<InputValidation> {
    match reply {
        Err(call_err) => PhaseOutcome::degraded(
            InputValidation::fail_open(format!(
                "Validation error: {}, proceeding anyway",
                call_err
            )),
            call_err,
        ),
        Ok(text) => match extract_json_object(&text)
            .map_err(|e| e.to_string())
            .and_then(|map| {
                serde_json::from_value::<InputValidation>(serde_json::Value::Object(map))
                    .map_err(|e| e.to_string())
            }) {
            Ok(validation) => PhaseOutcome::ok(validation),
            Err(parse_err) => PhaseOutcome::degraded(
                InputValidation::fail_open("Validation skipped, proceeding with request"),
                parse_err,
            ),
        },
    }
}

/// Phase node: validate the question before anything else runs.
pub struct ValidateInputNode {
    ctx: Arc<PhaseContext>,
}

impl ValidateInputNode {
    pub fn new(ctx: Arc<PhaseContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Node<AgentRunState> for ValidateInputNode {
    fn id(&self) -> &str {
        NODE_VALIDATE_INPUT
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        state.record_step(Phase::Validation, "Validating input");

        let memory_context = self.ctx.memory_block(&state.thread_id).await;
        let messages =
            build_input_validation_messages(&self.ctx.prompts, &state.question, &memory_context);
        let reply = self.ctx.complete(&messages, VALIDATION_MAX_TOKENS).await?;

        let outcome = interpret_validation_reply(reply);
        let message = if outcome.degraded {
            "Validation completed with fallback".to_string()
        } else {
            match outcome.value.status {
                ValidationStatus::Valid => "Input validated successfully".to_string(),
                ValidationStatus::NeedsClarification => {
                    format!("Clarification needed: {}", outcome.value.reason)
                }
                _ => format!("Input issue: {}", outcome.value.reason),
            }
        };
        state.input_validation = Some(outcome.value);
        state.record_step(Phase::Validation, message);

        Ok((state, Next::Continue))
    }
}
