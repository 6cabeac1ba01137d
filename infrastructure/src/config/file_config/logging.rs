//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving execution events (disabled when unset)
    pub event_log: Option<PathBuf>,
    /// Also emit execution events through `tracing`
    pub trace_events: bool,
}
