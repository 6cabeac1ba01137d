//! JSONL file writer for execution events.
//!
//! Each [`ExecutionEvent`] is serialized as a single JSON line carrying its
//! `type` tag plus a `timestamp`, appended to the file via a buffered writer.

use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use toolweave_application::EventSink;
use toolweave_domain::ExecutionEvent;
use tracing::warn;

/// JSONL event sink that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and on `Drop`.
pub struct JsonlEventSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventSink {
    /// Open the log for appending.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize an event with an RFC 3339 timestamp added
fn record_line(event: &ExecutionEvent) -> Option<String> {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let Ok(Value::Object(mut map)) = serde_json::to_value(event) else {
        return None;
    };
    map.insert("timestamp".to_string(), Value::String(timestamp));
    serde_json::to_string(&map).ok()
}

impl EventSink for JsonlEventSink {
    fn record(&self, event: &ExecutionEvent) {
        let Some(line) = record_line(event) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // JSONL is append-only; flush each line so a crash loses at most one event
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Could not write event log");
        }
    }
}

impl Drop for JsonlEventSink {
    fn drop(&mut self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}
