//! Execution parameters: executor control.
//!
//! [`ExecutionParams`] groups the static parameters that control how the
//! [`Executor`](crate::executor::Executor) runs a plan. Per-call settings on a
//! [`ToolCall`](toolweave_domain::ToolCall) override the timeout and retry
//! defaults here.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolweave_domain::BackoffPolicy;

/// Executor control parameters.
///
/// | Parameter | Scope | Overridable per call? |
/// |-----------|-------|----------------------|
/// | `max_in_flight` | one dependency level | No |
/// | `call_timeout` | one attempt | Yes (`timeout_ms`) |
/// | `max_retries` | one tool | Yes (`max_retries`) |
/// | `backoff` | between retries | No |
/// | `max_fallbacks` | one call | No |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Maximum calls dispatched concurrently within a level.
    pub max_in_flight: usize,
    /// Default timeout of a single attempt.
    pub call_timeout: Duration,
    /// Default retry budget per tool.
    pub max_retries: u32,
    /// Delay schedule between retries.
    pub backoff: BackoffPolicy,
    /// Alternative tools tried after the planned tool gives up.
    pub max_fallbacks: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            call_timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff: BackoffPolicy::default(),
            max_fallbacks: 2,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_fallbacks(mut self, max: usize) -> Self {
        self.max_fallbacks = max;
        self
    }
}
