//! Execution events routed through `tracing`.

use toolweave_application::EventSink;
use toolweave_domain::ExecutionEvent;
use tracing::{info, warn};

/// Emits each execution event as a structured `tracing` record
///
/// Events that signal trouble (breaker trips, fallbacks, retries) are
/// logged at `warn`, everything else at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &ExecutionEvent) {
        let payload = serde_json::to_string(event).unwrap_or_default();
        match event {
            ExecutionEvent::CircuitOpened { .. }
            | ExecutionEvent::FallbackSelected { .. }
            | ExecutionEvent::CallRetried { .. } => {
                warn!(
                    target: "toolweave::events",
                    kind = event.kind(),
                    %payload,
                    "Execution event"
                );
            }
            _ => {
                info!(
                    target: "toolweave::events",
                    kind = event.kind(),
                    %payload,
                    "Execution event"
                );
            }
        }
    }
}
