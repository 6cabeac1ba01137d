//! Discovery sources
//!
//! A [`DiscoverySource`] is either an internal registry or a proxy channel.
//! The [`SourceRegistry`] keeps them in registration order; that order
//! decides which source wins a name conflict, and the router resolves a
//! descriptor's owning source through it.

use std::sync::Arc;
use toolweave_domain::{ProviderError, SourceKind, ToolDefinition};

use crate::ports::internal_registry::InternalToolRegistry;
use crate::ports::proxy_channel::ProxyChannel;

#[derive(Clone)]
pub enum DiscoverySource {
    Internal(Arc<dyn InternalToolRegistry>),
    Proxy(Arc<dyn ProxyChannel>),
}

impl DiscoverySource {
    pub fn id(&self) -> &str {
        match self {
            DiscoverySource::Internal(registry) => registry.id(),
            DiscoverySource::Proxy(channel) => channel.id(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            DiscoverySource::Internal(_) => SourceKind::Internal,
            DiscoverySource::Proxy(_) => SourceKind::Proxy,
        }
    }

    /// Ask the source for its tools
    ///
    /// A proxy channel that reports itself unavailable is not queried.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        match self {
            DiscoverySource::Internal(registry) => registry.list_tools().await,
            DiscoverySource::Proxy(channel) => {
                if !channel.is_available().await {
                    return Err(ProviderError::NotAvailable(format!(
                        "channel '{}' is not available",
                        channel.id()
                    )));
                }
                channel.list_tools().await
            }
        }
    }
}

impl std::fmt::Debug for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoverySource")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Registered sources, in registration order
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<DiscoverySource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an internal registry
    pub fn with_internal(mut self, registry: Arc<dyn InternalToolRegistry>) -> Self {
        self.sources.push(DiscoverySource::Internal(registry));
        self
    }

    /// Register a proxy channel
    pub fn with_proxy(mut self, channel: Arc<dyn ProxyChannel>) -> Self {
        self.sources.push(DiscoverySource::Proxy(channel));
        self
    }

    pub fn get(&self, id: &str) -> Option<&DiscoverySource> {
        self.sources.iter().find(|s| s.id() == id)
    }

    pub fn sources(&self) -> &[DiscoverySource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
