//! Agent configuration with defaults and environment overrides.

use std::time::Duration;

use crate::memory::{DEFAULT_CONTEXT_LIMIT, DEFAULT_SUMMARY_INTERVAL};
use crate::state::DEFAULT_REACT_MAX_ITERATIONS;
use crate::tool_source::DEFAULT_TOOL_TIMEOUT;

/// Configuration for a [`LineAgent`](crate::agent::LineAgent).
///
/// Model selection and sampling belong to the injected
/// [`LlmClient`](crate::llm::LlmClient); this struct covers the
/// orchestration knobs.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Use the ReAct loop when live data is required (legacy sequential
    /// executor otherwise).
    pub react_enabled: bool,
    /// ReAct iteration bound.
    pub react_max_iterations: u32,
    /// Summary refresh interval in stored messages (0 disables).
    pub summary_interval: usize,
    /// Per-tool-call timeout.
    pub tool_timeout: Duration,
    /// Recent turns rendered into phase prompts.
    pub memory_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            react_enabled: true,
            react_max_iterations: DEFAULT_REACT_MAX_ITERATIONS,
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            memory_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl AgentConfig {
    /// Defaults overridden by environment variables:
    /// `AGENT_REACT_ENABLED`, `AGENT_REACT_MAX_ITERATIONS`,
    /// `AGENT_SUMMARY_INTERVAL`, `AGENT_TOOL_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(enabled) = env_parse::<bool>("AGENT_REACT_ENABLED") {
            config.react_enabled = enabled;
        }
        if let Some(max) = env_parse::<u32>("AGENT_REACT_MAX_ITERATIONS") {
            config.react_max_iterations = max;
        }
        if let Some(interval) = env_parse::<usize>("AGENT_SUMMARY_INTERVAL") {
            config.summary_interval = interval;
        }
        if let Some(secs) = env_parse::<u64>("AGENT_TOOL_TIMEOUT_SECS") {
            config.tool_timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Defaults match the documented contract values.
    #[test]
    fn defaults_match_contract() {
        let config = AgentConfig::default();
        assert!(config.react_enabled);
        assert_eq!(config.react_max_iterations, 5);
        assert_eq!(config.summary_interval, 12);
        assert_eq!(config.tool_timeout, Duration::from_secs(30));
        assert_eq!(config.memory_limit, 8);
    }
}
