//! Tool invocation client: timeout-bounded calls with structured outcomes.
//!
//! Every call — success, provider error, or timeout — becomes a
//! [`ToolResult`]; nothing here is a fatal error. The pipeline continues to
//! the next phase with degraded data when a tool fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::state::ToolResult;

use super::ToolSource;

/// Default per-call timeout.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Invocation client over a [`ToolSource`], owning the per-call timeout.
#[derive(Clone)]
pub struct ToolInvoker {
    tools: Arc<dyn ToolSource>,
    timeout: Duration,
}

impl ToolInvoker {
    /// Wraps a tool source with the default 30-second timeout.
    pub fn new(tools: Arc<dyn ToolSource>) -> Self {
        Self {
            tools,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The underlying source (for list_tools in planning and prompts).
    pub fn source(&self) -> &Arc<dyn ToolSource> {
        &self.tools
    }

    /// Calls a tool and reports the outcome as a [`ToolResult`].
    ///
    /// Timeouts surface as `success: false` with an error containing
    /// "timed out"; provider errors carry their message. Elapsed time is
    /// recorded for every outcome.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        let start = Instant::now();
        debug!(tool = %name, args = %arguments, "Calling tool");

        let outcome = tokio::time::timeout(self.timeout, self.tools.call_tool(name, arguments)).await;
        let execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(Ok(data)) => ToolResult {
                tool_name: name.to_string(),
                success: true,
                data: Some(data),
                error: String::new(),
                execution_time_ms,
            },
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                ToolResult {
                    tool_name: name.to_string(),
                    success: false,
                    data: None,
                    error: e.to_string(),
                    execution_time_ms,
                }
            }
            Err(_) => {
                warn!(tool = %name, timeout_secs = self.timeout.as_secs_f64(), "Tool call timed out");
                ToolResult {
                    tool_name: name.to_string(),
                    success: false,
                    data: None,
                    error: format!(
                        "Tool call timed out after {} seconds",
                        self.timeout.as_secs()
                    ),
                    execution_time_ms,
                }
            }
        }
    }
}
