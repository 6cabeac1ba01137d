//! Proxy channel port
//!
//! A proxy channel forwards calls to tools implemented elsewhere. The
//! transport (subprocess, remote call, ...) is opaque to the engine; only the
//! request/response contract below is relied upon.
//!
//! `forward` returns the target's **raw** response. Mapping it onto the
//! canonical result shape is the router's job, driven by the tool's declared
//! [`ParameterSchema`](toolweave_domain::ParameterSchema).

use async_trait::async_trait;
use serde_json::{Map, Value};
use toolweave_domain::{ProviderError, ToolDefinition, ToolError};

#[async_trait]
pub trait ProxyChannel: Send + Sync {
    /// Unique source identifier (e.g. "proxy:commands")
    fn id(&self) -> &str;

    /// Check if the channel can reach its targets
    async fn is_available(&self) -> bool {
        true
    }

    /// Enumerate the proxy tools reachable through this channel
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError>;

    /// Forward a call whose parameters are already in the target schema
    async fn forward(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError>;
}
