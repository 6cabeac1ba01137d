//! Built-in internal tools

mod provider;

pub use provider::{BUILTIN_ID, BuiltinToolRegistry};
