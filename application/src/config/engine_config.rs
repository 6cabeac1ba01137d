//! Engine configuration container.
//!
//! [`EngineConfig`] groups the configuration slices the engine components
//! need. Each component receives only its own slice.
//!
//! | Slice | Used by |
//! |-------|---------|
//! | [`ExecutionParams`] | Executor |
//! | [`DiscoveryParams`] | Discovery engine |
//! | [`BreakerConfig`] | Breaker registry |

use std::time::Duration;
use toolweave_domain::BreakerConfig;

use crate::config::ExecutionParams;

/// Discovery control parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryParams {
    /// How long a refresh result is reused before sources are queried again.
    pub cache_ttl: Duration,
    /// Upper bound on one source's discovery call.
    pub source_timeout: Duration,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            source_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub execution: ExecutionParams,
    pub discovery: DiscoveryParams,
    pub breaker: BreakerConfig,
}

impl EngineConfig {
    pub fn new(
        execution: ExecutionParams,
        discovery: DiscoveryParams,
        breaker: BreakerConfig,
    ) -> Self {
        Self {
            execution,
            discovery,
            breaker,
        }
    }

    pub fn with_execution(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryParams) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }
}
