//! Logging infrastructure: execution event sinks.
//!
//! Provides [`JsonlEventSink`], a JSONL file writer, and [`TracingEventSink`],
//! both implementing the [`EventSink`](toolweave_application::EventSink) port.

mod jsonl_sink;
mod tracing_sink;

pub use jsonl_sink::JsonlEventSink;
pub use tracing_sink::TracingEventSink;
