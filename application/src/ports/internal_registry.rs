//! Internal tool registry port
//!
//! Defines the interface to tools implemented inside this process. The
//! hybrid router calls [`InternalToolRegistry::invoke`] directly for every
//! non-proxy tool.

use async_trait::async_trait;
use serde_json::{Map, Value};
use toolweave_domain::{ProviderError, ToolDefinition, ToolError};

/// Port for in-process tool implementations
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait InternalToolRegistry: Send + Sync {
    /// Unique source identifier (e.g. "builtin")
    fn id(&self) -> &str;

    /// Enumerate the tools this registry implements
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError>;

    /// Invoke a tool with already-substituted parameters
    async fn invoke(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError>;
}
