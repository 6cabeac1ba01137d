//! Result substitution
//!
//! Parameter strings may reference the result of a dependency:
//!
//! | Placeholder | Inserts |
//! |-------------|---------|
//! | `${search}` | the whole payload of call `search` |
//! | `${search.items.0.url}` | a sub-field; numeric segments index arrays |
//!
//! A string that is exactly one placeholder becomes the referenced JSON value.
//! A placeholder embedded in longer text is replaced by the value's text form
//! (strings unquoted, everything else as compact JSON). Substitution recurses
//! into arrays and objects. Call IDs in placeholders end at the first `.`.

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use super::entities::{CallId, ToolCall};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    #[error("call '{call}' references '{reference}', which is not one of its dependencies")]
    NotADependency { call: CallId, reference: String },

    #[error("call '{call}': no result available for dependency '{reference}'")]
    MissingResult { call: CallId, reference: String },

    #[error("call '{call}': path '{path}' not found in result of '{reference}'")]
    MissingPath {
        call: CallId,
        reference: String,
        path: String,
    },

    #[error("call '{call}': malformed placeholder '{placeholder}'")]
    Malformed { call: CallId, placeholder: String },
}

/// Payloads of completed dependencies, keyed by call ID
pub type ResultLookup = HashMap<CallId, Value>;

/// Replace every placeholder in a call's parameters
pub fn substitute(
    call: &ToolCall,
    results: &ResultLookup,
) -> Result<Map<String, Value>, SubstitutionError> {
    let resolver = Resolver { call, results };
    call.params
        .iter()
        .map(|(key, value)| Ok((key.clone(), resolver.value(value)?)))
        .collect()
}

/// Call IDs referenced by placeholders anywhere in a value
pub fn references(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(text) => {
            for placeholder in placeholders(text) {
                let id = placeholder.inner.split('.').next().unwrap_or_default();
                if !found.iter().any(|f| f == id) {
                    found.push(id.to_string());
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

struct Placeholder<'a> {
    /// Byte range of `${...}` in the source text
    start: usize,
    end: usize,
    inner: &'a str,
}

fn placeholders(text: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find("${") {
        let start = cursor + offset;
        let Some(close) = text[start..].find('}') else {
            break;
        };
        let end = start + close + 1;
        found.push(Placeholder {
            start,
            end,
            inner: &text[start + 2..end - 1],
        });
        cursor = end;
    }
    found
}

struct Resolver<'a> {
    call: &'a ToolCall,
    results: &'a ResultLookup,
}

impl<'a> Resolver<'a> {
    fn value(&self, value: &Value) -> Result<Value, SubstitutionError> {
        match value {
            Value::String(text) => self.text(text),
            Value::Array(items) => items
                .iter()
                .map(|v| self.value(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.value(v)?)))
                .collect::<Result<Map<_, _>, _>>()
                .map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    fn text(&self, text: &str) -> Result<Value, SubstitutionError> {
        let found = placeholders(text);
        if found.is_empty() {
            return Ok(Value::String(text.to_string()));
        }

        if let [only] = found.as_slice()
            && only.start == 0
            && only.end == text.len()
        {
            return self.resolve(only.inner).cloned();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for placeholder in &found {
            out.push_str(&text[cursor..placeholder.start]);
            match self.resolve(placeholder.inner)? {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
            cursor = placeholder.end;
        }
        out.push_str(&text[cursor..]);
        Ok(Value::String(out))
    }

    fn resolve(&self, inner: &str) -> Result<&'a Value, SubstitutionError> {
        let mut segments = inner.split('.');
        let raw_reference = segments.next().unwrap_or_default();
        let reference = raw_reference.trim();
        if reference.is_empty() {
            return Err(SubstitutionError::Malformed {
                call: self.call.id.clone(),
                placeholder: format!("${{{}}}", inner),
            });
        }
        if !self.call.has_dependency(reference) {
            return Err(SubstitutionError::NotADependency {
                call: self.call.id.clone(),
                reference: reference.to_string(),
            });
        }

        let mut current =
            self.results
                .get(reference)
                .ok_or_else(|| SubstitutionError::MissingResult {
                    call: self.call.id.clone(),
                    reference: reference.to_string(),
                })?;

        for segment in segments {
            let next = match current {
                _ if segment.is_empty() => None,
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| SubstitutionError::MissingPath {
                call: self.call.id.clone(),
                reference: reference.to_string(),
                path: inner[raw_reference.len()..].trim_start_matches('.').to_string(),
            })?;
        }

        Ok(current)
    }
}
