//! Resilience layer
//!
//! Breaker bookkeeping per tool and capability-based fallback selection.
//! Retry scheduling lives in the executor, which owns the clock and the
//! cancellation token.

pub mod breakers;
pub mod fallback;

pub use breakers::BreakerRegistry;
pub use fallback::{fallback_candidates, unsatisfied};
