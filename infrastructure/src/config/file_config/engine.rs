//! Engine configuration from TOML (`[execution]`, `[resilience]`, `[discovery]`)
//!
//! Example configuration:
//!
//! ```toml
//! [execution]
//! max_in_flight = 8
//! call_timeout_ms = 15000
//! max_retries = 3
//! backoff_base_ms = 100
//! backoff_max_ms = 5000
//! max_fallbacks = 2
//!
//! [resilience]
//! failure_threshold = 5
//! cool_down_ms = 30000
//!
//! [discovery]
//! cache_ttl_secs = 60
//! source_timeout_ms = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolweave_application::{DiscoveryParams, ExecutionParams};
use toolweave_domain::{BackoffPolicy, BreakerConfig};

/// Raw `[execution]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    /// Calls dispatched concurrently within one dependency level
    pub max_in_flight: usize,
    /// Default per-attempt timeout
    pub call_timeout_ms: u64,
    /// Default retry budget per tool
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Alternatives tried after the planned tool gives up
    pub max_fallbacks: usize,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        let backoff = BackoffPolicy::default();
        Self {
            max_in_flight: params.max_in_flight,
            call_timeout_ms: params.call_timeout.as_millis() as u64,
            max_retries: params.max_retries,
            backoff_base_ms: backoff.base.as_millis() as u64,
            backoff_max_ms: backoff.max.as_millis() as u64,
            max_fallbacks: params.max_fallbacks,
        }
    }
}

impl FileExecutionConfig {
    pub fn to_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_max_in_flight(self.max_in_flight)
            .with_call_timeout(Duration::from_millis(self.call_timeout_ms))
            .with_max_retries(self.max_retries)
            .with_backoff(BackoffPolicy::new(
                Duration::from_millis(self.backoff_base_ms),
                Duration::from_millis(self.backoff_max_ms),
            ))
            .with_max_fallbacks(self.max_fallbacks)
    }
}

/// Raw `[resilience]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResilienceConfig {
    /// Consecutive failures that open a tool's circuit
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before a trial
    pub cool_down_ms: u64,
}

impl Default for FileResilienceConfig {
    fn default() -> Self {
        let breaker = BreakerConfig::default();
        Self {
            failure_threshold: breaker.failure_threshold,
            cool_down_ms: breaker.cool_down.as_millis() as u64,
        }
    }
}

impl FileResilienceConfig {
    pub fn to_breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold,
            cool_down: Duration::from_millis(self.cool_down_ms),
        }
    }
}

/// Raw `[discovery]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiscoveryConfig {
    pub cache_ttl_secs: u64,
    pub source_timeout_ms: u64,
}

impl Default for FileDiscoveryConfig {
    fn default() -> Self {
        let params = DiscoveryParams::default();
        Self {
            cache_ttl_secs: params.cache_ttl.as_secs(),
            source_timeout_ms: params.source_timeout.as_millis() as u64,
        }
    }
}

impl FileDiscoveryConfig {
    pub fn to_params(&self) -> DiscoveryParams {
        DiscoveryParams {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            source_timeout: Duration::from_millis(self.source_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        assert_eq!(
            FileExecutionConfig::default().to_params(),
            ExecutionParams::default()
        );
        assert_eq!(
            FileDiscoveryConfig::default().to_params(),
            DiscoveryParams::default()
        );
        assert_eq!(
            FileResilienceConfig::default().to_breaker_config(),
            BreakerConfig::default()
        );
    }

    #[test]
    fn test_execution_deserialize() {
        let toml_str = r#"
[execution]
max_in_flight = 8
max_retries = 0
backoff_base_ms = 10
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let params = config.execution.to_params();
        assert_eq!(params.max_in_flight, 8);
        assert_eq!(params.max_retries, 0);
        assert_eq!(params.backoff.base, Duration::from_millis(10));
        // Unset keys keep their defaults
        assert_eq!(params.max_fallbacks, 2);
    }
}
