//! Tool adapters
//!
//! - [`builtin`]: in-process tools served by the internal registry
//! - [`proxy`]: channels forwarding calls to tools outside the process

pub mod args;
pub mod builtin;
pub mod file;
pub mod memory;
pub mod proxy;
pub mod search;

pub use builtin::{BUILTIN_ID, BuiltinToolRegistry};
pub use memory::KnowledgeStore;
pub use proxy::{CommandProxyChannel, CommandTool};
