//! Planning phase: select and order the tools for the legacy path.
//!
//! When no live data is needed the phase short-circuits to the direct
//! strategy without spending an LLM call. Planned tool names not present in
//! the live capability registry are silently dropped.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::parse::extract_json_object;
use crate::prompts::build_planning_messages;
use crate::state::{AgentRunState, ExecutionStrategy, Phase, ToolPlanItem};

use super::context::{PhaseContext, PhaseOutcome};
use super::NODE_PLAN;

const PLANNING_MAX_TOKENS: u32 = 500;

/// Wire shape of the planner's reply.
#[derive(Debug, Default, Deserialize)]
struct PlanReply {
    #[serde(default)]
    tool_plan: Vec<ToolPlanItem>,
    #[serde(default)]
    execution_strategy: Option<String>,
}

/// A parsed plan plus the strategy to run it with.
#[derive(Debug, Clone)]
pub(crate) struct PlannedExecution {
    pub plan: Vec<ToolPlanItem>,
    pub strategy: ExecutionStrategy,
}

/// Interprets the planner's reply against the live registry.
///
/// - unparseable reply → empty plan, sequential strategy (run continues);
/// - parsed plan → entries filtered to registered tool names only.
pub(crate) fn interpret_plan_reply(
    text: &str,
    registered: &HashSet<String>,
) -> PhaseOutcome<PlannedExecution> {
    let parsed: Result<PlanReply, String> = extract_json_object(text)
        .map_err(|e| e.to_string())
        .and_then(|map| {
            serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| e.to_string())
        });

    match parsed {
        Err(e) => PhaseOutcome::degraded(
            PlannedExecution {
                plan: vec![],
                strategy: ExecutionStrategy::Sequential,
            },
            e,
        ),
        Ok(reply) => {
            let plan: Vec<ToolPlanItem> = reply
                .tool_plan
                .into_iter()
                .filter(|item| registered.contains(&item.name))
                .collect();
            let strategy = match reply.execution_strategy.as_deref() {
                Some("direct") => ExecutionStrategy::Direct,
                // "parallel" is not a supported execution mode; tool calls
                // are deliberately one at a time.
                _ => ExecutionStrategy::Sequential,
            };
            PhaseOutcome::ok(PlannedExecution { plan, strategy })
        }
    }
}

/// Phase node: produce the tool plan (or the direct short-circuit).
pub struct PlanNode {
    ctx: Arc<PhaseContext>,
}

impl PlanNode {
    pub fn new(ctx: Arc<PhaseContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Node<AgentRunState> for PlanNode {
    fn id(&self) -> &str {
        NODE_PLAN
    }

    async fn run(&self, mut state: AgentRunState) -> Result<(AgentRunState, Next), AgentError> {
        state.record_step(Phase::Planning, "Creating execution plan");

        if !state.requires_live_data() {
            state.tool_plan = vec![];
            state.execution_strategy = ExecutionStrategy::Direct;
            state.record_step(Phase::Planning, "Direct response path (no tools needed)");
            return Ok((state, Next::Continue));
        }

        let intent = match state.intent.clone() {
            Some(i) => i,
            // requires_live_data() is false without intent, so this branch is
            // unreachable through the normal wiring.
            None => {
                state.execution_strategy = ExecutionStrategy::Direct;
                state.record_step(Phase::Planning, "No intent available; direct response");
                return Ok((state, Next::Continue));
            }
        };

        let memory_context = self.ctx.memory_block(&state.thread_id).await;
        let messages =
            build_planning_messages(&self.ctx.prompts, &state.question, &intent, &memory_context);

        match self.ctx.complete(&messages, PLANNING_MAX_TOKENS).await? {
            Err(call_err) => {
                state.tool_plan = vec![];
                state.execution_strategy = ExecutionStrategy::Direct;
                state.data.planning_error = Some(call_err);
                state.record_step(Phase::Planning, "Using direct response (planning unavailable)");
            }
            Ok(text) => {
                let registered: HashSet<String> = self
                    .ctx
                    .registered_tools()
                    .await
                    .into_iter()
                    .map(|t| t.name)
                    .collect();
                let outcome = interpret_plan_reply(&text, &registered);
                state.tool_plan = outcome.value.plan;
                state.execution_strategy = outcome.value.strategy;
                if state.tool_plan.is_empty() {
                    state.record_step(Phase::Planning, "No tools required");
                } else {
                    let tool_names = state
                        .tool_plan
                        .iter()
                        .map(|t| t.name.replace('_', " "))
                        .collect::<Vec<_>>()
                        .join(", ");
                    state.record_step(Phase::Planning, format!("Plan: {}", tool_names));
                }
            }
        }

        Ok((state, Next::Continue))
    }
}
