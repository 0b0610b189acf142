//! Agent run state: one instance per question, threaded through every phase.
//!
//! The state is a tagged struct with explicit optional fields per phase (not
//! an open map): each phase fills its own sub-structure strictly additively,
//! and the timeline is the append-only audit trail. Satisfies
//! `Clone + Send + Sync + Debug + 'static` for use with
//! `Node<AgentRunState>` and `StateGraph<AgentRunState>`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default ReAct iteration bound (the runaway-loop guard).
pub const DEFAULT_REACT_MAX_ITERATIONS: u32 = 5;

/// Outcome of the input-validation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    NeedsClarification,
    OffTopic,
}

fn default_true() -> bool {
    true
}

/// Result of the input-validation phase.
///
/// `status` is required in the model reply; the flags default to permissive
/// values so a sparse-but-statused reply still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputValidation {
    pub status: ValidationStatus,
    #[serde(default = "default_true")]
    pub is_safe: bool,
    #[serde(default = "default_true")]
    pub is_clear: bool,
    #[serde(default = "default_true")]
    pub is_relevant: bool,
    #[serde(default)]
    pub reason: String,
    /// Suggested follow-up question when status is NeedsClarification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_clarification: Option<String>,
}

impl InputValidation {
    /// Fail-open value: never block a user on validator failure.
    pub fn fail_open(reason: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Valid,
            is_safe: true,
            is_clear: true,
            is_relevant: true,
            reason: reason.into(),
            suggested_clarification: None,
        }
    }
}

/// One entity extracted by the understanding phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity kind: "station" | "product" | "time_range" | "metric" | "other".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn default_intent_confidence() -> f64 {
    0.7
}

/// Result of the understanding phase.
///
/// `primary_intent` and `requires_live_data` are required in the model
/// reply; an object missing either is treated as a parse failure and the
/// heuristic fallback fires instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub primary_intent: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub requires_live_data: bool,
    #[serde(default = "default_intent_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub summary: String,
}

/// A single tool call in the pre-committed execution plan (legacy mode only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPlanItem {
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub priority: i32,
}

/// How the run executes its tool work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// No tool work at all; synthesize straight from the question.
    Direct,
    /// One tool call at a time in plan order (legacy, non-ReAct path).
    Sequential,
}

/// Result of one tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: String,
    pub execution_time_ms: f64,
}

/// A single step in the ReAct (Reason → Act → Observe) loop. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActStep {
    /// 1-based loop iteration this step belongs to.
    pub iteration: u32,
    /// The model's reasoning about what to do next.
    pub thought: String,
    /// The tool to call, or "finish" to terminate.
    pub action: String,
    /// Arguments for the tool (or `{"answer": …}` for finish).
    pub action_input: Value,
    /// Result text filled in by the action node.
    pub observation: String,
}

/// Result of the output-validation phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputValidation {
    pub is_complete: bool,
    pub is_accurate: bool,
    pub is_safe: bool,
    pub confidence: f64,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Pipeline phases as recorded in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validation,
    Understanding,
    Planning,
    ReactReasoning,
    ReactAction,
    Execution,
    OutputValidation,
    Synthesis,
}

impl Phase {
    /// Stable snake_case name used in timeline rendering and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validation => "validation",
            Phase::Understanding => "understanding",
            Phase::Planning => "planning",
            Phase::ReactReasoning => "react_reasoning",
            Phase::ReactAction => "react_action",
            Phase::Execution => "execution",
            Phase::OutputValidation => "output_validation",
            Phase::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit-trail entry. The timeline is never reordered; only the last
/// entry's message is rewritten at finalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub phase: Phase,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_keys: Option<Vec<String>>,
}

/// A tool failure recorded for synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub tool: String,
    pub error: String,
}

/// Scratch data carrying legacy-shaped aliases for downstream consumers.
///
/// Well-known tool outputs are mirrored into named fields so the synthesis
/// context (and any UI reading the final state) finds them where the
/// original transport placed them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScratchData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottleneck: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oee: Option<Value>,
    /// Raw data of every successful tool call, keyed by tool name.
    #[serde(default)]
    pub tools: BTreeMap<String, Value>,
    #[serde(default)]
    pub tool_errors: Vec<ToolError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ScratchData {
    /// Mirrors a successful tool result into the legacy aliases.
    pub fn record_tool_data(&mut self, tool_name: &str, data: &Value) {
        self.tools.insert(tool_name.to_string(), data.clone());
        match tool_name {
            "get_production_metrics" => self.metrics = Some(data.clone()),
            "find_bottleneck" => self.bottleneck = Some(data.clone()),
            "calculate_oee" => self.oee = Some(data.clone()),
            _ => {}
        }
    }
}

/// Complete agent state for one question, mutated in place through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunState {
    pub question: String,
    pub thread_id: String,

    pub input_validation: Option<InputValidation>,
    pub intent: Option<IntentAnalysis>,

    pub tool_plan: Vec<ToolPlanItem>,
    pub execution_strategy: ExecutionStrategy,

    pub tool_results: BTreeMap<String, ToolResult>,
    /// Short per-tool outcome lines consumed by the synthesis context.
    pub observations: Vec<String>,

    pub output_validation: Option<OutputValidation>,

    /// Whether the ReAct loop (vs. the legacy sequential executor) is used
    /// when live data is required.
    pub react_enabled: bool,
    /// History of Thought/Action/Observation steps; append-only.
    pub react_steps: Vec<ReActStep>,
    /// Current iteration count; never exceeds `react_max_iterations`.
    pub react_iteration: u32,
    pub react_max_iterations: u32,

    pub timeline: Vec<TimelineEntry>,
    pub current_phase: Phase,
    pub data: ScratchData,
}

impl AgentRunState {
    /// Builds the initial state for a run. Generates a thread id when absent.
    pub fn new(question: impl Into<String>, thread_id: Option<String>) -> Self {
        let thread_id =
            thread_id.unwrap_or_else(|| format!("thread-{}", uuid::Uuid::new_v4().simple()));
        Self {
            question: question.into(),
            thread_id,
            input_validation: None,
            intent: None,
            tool_plan: Vec::new(),
            execution_strategy: ExecutionStrategy::Sequential,
            tool_results: BTreeMap::new(),
            observations: Vec::new(),
            output_validation: None,
            react_enabled: true,
            react_steps: Vec::new(),
            react_iteration: 0,
            react_max_iterations: DEFAULT_REACT_MAX_ITERATIONS,
            timeline: Vec::new(),
            current_phase: Phase::Validation,
            data: ScratchData::default(),
        }
    }

    /// Disables the ReAct loop so live-data runs use the legacy sequential executor.
    pub fn with_react_enabled(mut self, enabled: bool) -> Self {
        self.react_enabled = enabled;
        self
    }

    /// Overrides the ReAct iteration bound.
    pub fn with_react_max_iterations(mut self, max: u32) -> Self {
        self.react_max_iterations = max;
        self
    }

    /// Appends a structured timeline entry and updates the current phase.
    pub fn record_step(&mut self, phase: Phase, message: impl Into<String>) {
        self.record_step_with_keys(phase, message, None);
    }

    /// Like [`record_step`](Self::record_step), with the data keys this entry touched.
    pub fn record_step_with_keys(
        &mut self,
        phase: Phase,
        message: impl Into<String>,
        data_keys: Option<Vec<String>>,
    ) {
        self.timeline.push(TimelineEntry {
            phase,
            message: message.into(),
            timestamp: Utc::now(),
            data_keys,
        });
        self.current_phase = phase;
    }

    /// Whether intent analysis concluded live data is required.
    pub fn requires_live_data(&self) -> bool {
        self.intent
            .as_ref()
            .map(|i| i.requires_live_data)
            .unwrap_or(false)
    }

    /// Whether any ReAct step has terminated the loop with "finish".
    pub fn react_finished(&self) -> bool {
        self.react_steps
            .iter()
            .any(|s| s.action.trim().eq_ignore_ascii_case("finish"))
    }

    /// The final answer, when synthesis has run.
    pub fn answer(&self) -> Option<&str> {
        self.data.answer.as_deref()
    }
}
