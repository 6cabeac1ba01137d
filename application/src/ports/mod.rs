//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod event_sink;
pub mod internal_registry;
pub mod proxy_channel;

pub use event_sink::{CompositeEventSink, EventSink, NoEventSink};
pub use internal_registry::InternalToolRegistry;
pub use proxy_channel::ProxyChannel;
