//! Port for structured execution telemetry.
//!
//! Defines the [`EventSink`] trait receiving every [`ExecutionEvent`] the
//! engine emits (call outcomes, retries, fallbacks, breaker trips, plan and
//! catalog milestones).
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the
//! machine-readable event stream an observability collaborator consumes.

use std::sync::Arc;
use toolweave_domain::ExecutionEvent;

/// Port for recording execution events.
///
/// The `record` method is synchronous and infallible so telemetry can never
/// disrupt execution; sink failures are the sink's own concern.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &ExecutionEvent);
}

/// No-op implementation for tests and when telemetry is disabled.
pub struct NoEventSink;

impl EventSink for NoEventSink {
    fn record(&self, _event: &ExecutionEvent) {}
}

/// A sink that delegates to multiple inner sinks.
///
/// ```text
/// Executor ──record──▶ CompositeEventSink
///                         ├──▶ JsonlEventSink   (event log file)
///                         └──▶ TracingEventSink (diagnostic log)
/// ```
pub struct CompositeEventSink {
    delegates: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(delegates: Vec<Arc<dyn EventSink>>) -> Self {
        Self { delegates }
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl EventSink for CompositeEventSink {
    fn record(&self, event: &ExecutionEvent) {
        for d in &self.delegates {
            d.record(event);
        }
    }
}
