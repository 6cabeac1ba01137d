//! Per-tool circuit breaker state machine
//!
//! ```text
//!            threshold consecutive failures
//!   Closed ─────────────────────────────────▶ Open
//!     ▲                                        │ cool-down elapsed
//!     │ trial succeeds                         ▼
//!     └──────────────────────────────────── HalfOpen ──trial fails──▶ Open
//! ```
//!
//! The breaker is a plain value. Time is passed in explicitly so transitions
//! are deterministic; the application layer owns the clock and the locking.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker
    pub failure_threshold: u32,
    /// How long the breaker stays open before admitting a trial
    pub cool_down: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

/// Why a dispatch was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Open and still cooling down
    Open { retry_in: Duration },
    /// Half-open with the single trial already in flight
    TrialInFlight,
}

/// Result of recording a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still closed; failure counted
    Counted(u32),
    /// The breaker transitioned to open on this failure
    Opened,
    /// Already open; nothing changed
    AlreadyOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }

    /// State as observed at `now` (an open breaker past its cool-down reads half-open)
    pub fn state_at(&self, now: Instant) -> CircuitState {
        match self.state {
            CircuitState::Open if self.cool_down_elapsed(now) => CircuitState::HalfOpen,
            state => state,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Ask permission to dispatch
    ///
    /// Closed always admits. Open rejects until the cool-down has elapsed,
    /// then moves to half-open and admits exactly one trial.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Rejection> {
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                if self.cool_down_elapsed(now) {
                    self.state = CircuitState::HalfOpen;
                    self.trial_in_flight = true;
                    Ok(())
                } else {
                    Err(Rejection::Open {
                        retry_in: self.remaining_cool_down(now),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    Err(Rejection::TrialInFlight)
                } else {
                    self.trial_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// A dispatch succeeded: close and reset
    pub fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.trial_in_flight = false;
    }

    /// A dispatch failed
    pub fn record_failure(&mut self, now: Instant) -> FailureOutcome {
        match self.state {
            CircuitState::HalfOpen => {
                self.open(now);
                FailureOutcome::Opened
            }
            CircuitState::Open => FailureOutcome::AlreadyOpen,
            CircuitState::Closed => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.config.failure_threshold {
                    self.open(now);
                    FailureOutcome::Opened
                } else {
                    FailureOutcome::Counted(self.consecutive_failures)
                }
            }
        }
    }

    /// An admitted dispatch ended without an outcome that says anything
    /// about the tool (e.g. parameters were invalid); free the trial slot
    pub fn release(&mut self) {
        self.trial_in_flight = false;
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.trial_in_flight = false;
    }

    fn cool_down_elapsed(&self, now: Instant) -> bool {
        self.opened_at
            .is_none_or(|at| now.saturating_duration_since(at) >= self.config.cool_down)
    }

    fn remaining_cool_down(&self, now: Instant) -> Duration {
        self.opened_at
            .map(|at| {
                self.config
                    .cool_down
                    .saturating_sub(now.saturating_duration_since(at))
            })
            .unwrap_or_default()
    }
}
