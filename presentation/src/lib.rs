//! Presentation layer for toolweave
//!
//! This crate contains the CLI definitions and the console and JSON
//! formatters for catalogs, plans and execution reports.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat, parse_dependency_hints};
pub use output::console::{ConfigSourceLine, ConsoleFormatter};
pub use output::formatter::{format_json, render};
