//! Parameter accessors for built-in tools
//!
//! The router validates presence and declared types before a built-in tool
//! runs, so these mostly guard against direct invocation.

use serde_json::{Map, Value};
use toolweave_domain::ToolError;

pub fn require_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid_argument(format!("'{}' must be a string", key)))
}

pub fn get_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub fn get_usize(params: &Map<String, Value>, key: &str) -> Option<usize> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}

pub fn get_bool(params: &Map<String, Value>, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

/// Text form of a value: strings as-is, anything else as JSON
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
