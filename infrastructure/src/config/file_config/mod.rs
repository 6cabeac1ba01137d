//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into engine types on demand.

mod engine;
mod logging;
mod tools;

pub use engine::{FileDiscoveryConfig, FileExecutionConfig, FileResilienceConfig};
pub use logging::FileLoggingConfig;
pub use tools::{FileBuiltinConfig, FileProxyConfig, FileProxyParameter, FileProxyToolConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use toolweave_application::EngineConfig;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    ZeroValue { field: &'static str },

    #[error("proxy tool '{tool}' has an empty command")]
    EmptyProxyCommand { tool: String },

    #[error("proxy tool name cannot be empty")]
    EmptyProxyToolName,

    #[error("proxy tool '{tool}' is declared more than once")]
    DuplicateProxyTool { tool: String },

    #[error("proxy tool '{tool}' has a timeout of 0")]
    ZeroProxyTimeout { tool: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Executor settings
    pub execution: FileExecutionConfig,
    /// Circuit breaker settings
    pub resilience: FileResilienceConfig,
    /// Discovery cache and timeouts
    pub discovery: FileDiscoveryConfig,
    /// Built-in tool registry
    pub builtin: FileBuiltinConfig,
    /// Subprocess proxy tools
    pub proxy: FileProxyConfig,
    /// Event log settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        let zero_checks: [(&'static str, bool); 6] = [
            ("execution.max_in_flight", self.execution.max_in_flight == 0),
            ("execution.call_timeout_ms", self.execution.call_timeout_ms == 0),
            ("resilience.failure_threshold", self.resilience.failure_threshold == 0),
            ("resilience.cool_down_ms", self.resilience.cool_down_ms == 0),
            ("discovery.source_timeout_ms", self.discovery.source_timeout_ms == 0),
            ("execution.backoff_max_ms", self.execution.backoff_max_ms == 0),
        ];
        issues.extend(
            zero_checks
                .into_iter()
                .filter(|(_, zero)| *zero)
                .map(|(field, _)| ConfigValidationError::ZeroValue { field }),
        );

        let mut seen = HashSet::new();
        for tool in &self.proxy.tools {
            if tool.name.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyProxyToolName);
                continue;
            }
            if !seen.insert(tool.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateProxyTool {
                    tool: tool.name.clone(),
                });
            }
            if tool.command.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyProxyCommand {
                    tool: tool.name.clone(),
                });
            }
            if tool.timeout_ms == Some(0) {
                issues.push(ConfigValidationError::ZeroProxyTimeout {
                    tool: tool.name.clone(),
                });
            }
        }

        issues
    }

    /// Engine configuration slices for the orchestrator
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            self.execution.to_params(),
            self.discovery.to_params(),
            self.resilience.to_breaker_config(),
        )
    }
}
