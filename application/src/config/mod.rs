//! Application-level configuration.
//!
//! This module provides configuration types that control how the engine
//! components behave:
//!
//! - [`ExecutionParams`]: executor control (concurrency, timeouts, retries, fallbacks)
//! - [`DiscoveryParams`]: discovery cache and per-source timeout
//! - [`EngineConfig`]: container handing each component its slice

pub mod engine_config;
pub mod execution_params;

pub use engine_config::{DiscoveryParams, EngineConfig};
pub use execution_params::ExecutionParams;
