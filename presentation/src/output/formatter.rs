//! Output format dispatch

use serde::Serialize;

use crate::cli::commands::OutputFormat;

/// Render `value` as pretty JSON, or as text through `text`
pub fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> String {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => format_json(value),
    }
}

pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
