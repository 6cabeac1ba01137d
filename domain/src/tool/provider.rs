//! Source-level failures
//!
//! A tool source (the internal registry or a proxy channel) can fail as a
//! whole: it may be unreachable, misconfigured, or unable to enumerate its
//! tools. Those failures are [`ProviderError`]s and are reported per source
//! by discovery. Failures of a single tool invocation are not provider
//! errors; they are [`ToolError`](super::value_objects::ToolError) values.

use serde::Serialize;
use thiserror::Error;

/// Error type for tool source operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProviderError {
    /// Source is not reachable (e.g., proxy command not installed)
    #[error("Source not available: {0}")]
    NotAvailable(String),

    /// Source answered but failed to enumerate its tools
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Source did not answer within the discovery timeout
    #[error("Discovery timed out after {0}ms")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
