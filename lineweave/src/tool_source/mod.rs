//! Tool source abstraction: list capabilities and call a tool.
//!
//! The pipeline depends on [`ToolSource`] instead of a concrete provider:
//! `list_tools()` feeds the planning filter and the ReAct prompt builder,
//! `call_tool(name, args)` executes one capability. The production-data
//! provider itself is external; [`MockToolSource`] supplies canned
//! production-line fixtures for tests and the CLI demo.
//!
//! Layered on top:
//!
//! - [`args`]: per-tool argument validation (typed schemas, unknown-tool
//!   rejection) that never contacts the provider;
//! - [`ToolInvoker`]: the invocation client that owns the per-call timeout
//!   and converts every outcome into a structured [`ToolResult`].

pub mod args;
mod invoker;
mod mock;

pub use invoker::{ToolInvoker, DEFAULT_TOOL_TIMEOUT};
pub use mock::{demo_tool_specs, MockToolSource};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool specification: name, description, and JSON Schema for arguments.
///
/// Consumed by the ReAct prompt builder and by the planning filter.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Errors from listing or calling tools.
#[derive(Debug, Clone, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Tool source: list tools and call a tool by name with JSON arguments.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Lists the registered capabilities.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Calls a tool; the result is an arbitrary JSON-serializable value.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolSourceError>;
}
