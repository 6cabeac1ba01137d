//! Resilience domain: failure taxonomy, breaker state machine, retry backoff

pub mod backoff;
pub mod circuit_breaker;
pub mod classification;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{BreakerConfig, CircuitBreaker, CircuitState, FailureOutcome, Rejection};
pub use classification::ErrorCategory;
