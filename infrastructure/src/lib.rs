//! Infrastructure layer for toolweave
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigSource, ConfigValidationError, FileConfig};
pub use logging::{JsonlEventSink, TracingEventSink};
pub use tools::{BuiltinToolRegistry, CommandProxyChannel, CommandTool, KnowledgeStore};
