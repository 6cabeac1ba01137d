//! Per-tool circuit breakers
//!
//! Breakers are created lazily on first use, one per tool name. Each one
//! sits behind its own lock so a trip on one tool never stalls dispatch to
//! another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use toolweave_domain::{
    BreakerConfig, CircuitBreaker, CircuitState, ErrorCategory, ExecutionEvent, FailureOutcome,
    Rejection,
};
use tracing::{debug, warn};

use crate::ports::event_sink::EventSink;

pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: Mutex<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
    events: Arc<dyn EventSink>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    fn breaker(&self, tool: &str) -> Arc<Mutex<CircuitBreaker>> {
        self.breakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tool.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::new(self.config))))
            .clone()
    }

    fn with_breaker<R>(&self, tool: &str, f: impl FnOnce(&mut CircuitBreaker) -> R) -> R {
        let breaker = self.breaker(tool);
        let mut guard = breaker.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Ask permission to dispatch to `tool`
    pub fn try_acquire(&self, tool: &str) -> Result<(), Rejection> {
        let result = self.with_breaker(tool, |b| b.try_acquire(Instant::now()));
        if let Err(rejection) = &result {
            debug!(tool, ?rejection, "Breaker rejected dispatch");
        }
        result
    }

    pub fn record_success(&self, tool: &str) {
        self.with_breaker(tool, CircuitBreaker::record_success);
    }

    /// Record a failed dispatch
    ///
    /// Only categories that say something about the tool's health count
    /// toward the threshold; others just free a half-open trial slot.
    pub fn record_failure(&self, tool: &str, category: ErrorCategory) {
        if !category.trips_breaker() {
            self.with_breaker(tool, CircuitBreaker::release);
            return;
        }

        let (outcome, failures) = self.with_breaker(tool, |b| {
            let outcome = b.record_failure(Instant::now());
            (outcome, b.consecutive_failures())
        });
        if outcome == FailureOutcome::Opened {
            warn!(tool, consecutive_failures = failures, "Circuit opened");
            self.events.record(&ExecutionEvent::CircuitOpened {
                tool: tool.to_string(),
                consecutive_failures: failures,
            });
        }
    }

    pub fn state(&self, tool: &str) -> CircuitState {
        self.with_breaker(tool, |b| b.state_at(Instant::now()))
    }

    /// Open and still cooling down
    pub fn is_open(&self, tool: &str) -> bool {
        self.state(tool) == CircuitState::Open
    }

    /// Remaining cool-down for an open breaker
    pub fn retry_in(rejection: &Rejection) -> Duration {
        match rejection {
            Rejection::Open { retry_in } => *retry_in,
            Rejection::TrialInFlight => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEventSink;

    fn registry(threshold: u32, cool_down: Duration) -> (BreakerRegistry, Arc<RecordingEventSink>) {
        let events = Arc::new(RecordingEventSink::new());
        let config = BreakerConfig {
            failure_threshold: threshold,
            cool_down,
        };
        (BreakerRegistry::new(config, events.clone()), events)
    }

    #[test]
    fn test_threshold_opens_and_emits_once() {
        let (registry, events) = registry(3, Duration::from_secs(60));

        for _ in 0..3 {
            registry.try_acquire("notify").unwrap();
            registry.record_failure("notify", ErrorCategory::RemoteExecutionError);
        }

        assert!(registry.is_open("notify"));
        assert!(matches!(
            registry.try_acquire("notify"),
            Err(Rejection::Open { .. })
        ));
        assert_eq!(events.kinds(), vec!["circuit_opened"]);
        // Other tools are unaffected
        assert_eq!(registry.state("search"), CircuitState::Closed);
    }

    #[test]
    fn test_invalid_parameters_do_not_count() {
        let (registry, events) = registry(2, Duration::from_secs(60));

        for _ in 0..5 {
            registry.try_acquire("store").unwrap();
            registry.record_failure("store", ErrorCategory::InvalidParameters);
        }
        assert_eq!(registry.state("store"), CircuitState::Closed);
        assert!(events.kinds().is_empty());
    }

    #[test]
    fn test_half_open_admits_one_trial() {
        let (registry, events) = registry(1, Duration::from_millis(10));

        registry.try_acquire("fetch").unwrap();
        registry.record_failure("fetch", ErrorCategory::TransientIo);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(registry.state("fetch"), CircuitState::HalfOpen);
        registry.try_acquire("fetch").unwrap();
        assert_eq!(
            registry.try_acquire("fetch"),
            Err(Rejection::TrialInFlight)
        );

        // Failed trial re-opens
        registry.record_failure("fetch", ErrorCategory::TransientIo);
        assert!(registry.is_open("fetch"));
        assert_eq!(events.count("circuit_opened"), 2);
    }

    #[test]
    fn test_successful_trial_closes() {
        let (registry, _) = registry(1, Duration::from_millis(10));

        registry.try_acquire("fetch").unwrap();
        registry.record_failure("fetch", ErrorCategory::TransientIo);
        std::thread::sleep(Duration::from_millis(20));

        registry.try_acquire("fetch").unwrap();
        registry.record_success("fetch");
        assert_eq!(registry.state("fetch"), CircuitState::Closed);
        registry.try_acquire("fetch").unwrap();
    }
}
