//! In-memory knowledge store: memory_store, memory_recall
//!
//! Entries live for the lifetime of the registry. Keys are caller-chosen or
//! generated (`entry-<n>`); storing under an existing key replaces it.
//! Recall matches the query case-insensitively against keys and the text
//! form of stored content, newest first.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use toolweave_domain::{ParamType, ToolDefinition, ToolError, ToolParameter};

use super::args::{as_text, get_str, get_usize};

/// Tool name constants
pub const MEMORY_STORE: &str = "memory_store";
pub const MEMORY_RECALL: &str = "memory_recall";

const DEFAULT_RECALL_LIMIT: usize = 10;

pub fn memory_store_definition() -> ToolDefinition {
    ToolDefinition::new(MEMORY_STORE, "Remember a piece of content under a key")
        .with_capability("store")
        .with_parameter(
            ToolParameter::new("content", "Content to remember", true).with_type(ParamType::Any),
        )
        .with_parameter(ToolParameter::new(
            "key",
            "Key to store under (generated when omitted)",
            false,
        ))
}

pub fn memory_recall_definition() -> ToolDefinition {
    ToolDefinition::new(MEMORY_RECALL, "Recall remembered content matching a query")
        .with_capability("recall")
        .with_parameter(
            ToolParameter::new("query", "Text to look for in keys and content", true)
                .with_type(ParamType::Any),
        )
        .with_parameter(
            ToolParameter::new("limit", "Maximum entries returned (default: 10)", false)
                .with_type(ParamType::Integer),
        )
}

#[derive(Debug)]
struct Entry {
    sequence: u64,
    content: Value,
}

#[derive(Debug, Default)]
struct Entries {
    by_key: BTreeMap<String, Entry>,
    next: u64,
}

#[derive(Debug, Default)]
pub struct KnowledgeStore {
    entries: RwLock<Entries>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_key
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn store(&self, params: &Map<String, Value>) -> Result<Value, ToolError> {
        let content = params
            .get("content")
            .cloned()
            .ok_or_else(|| ToolError::invalid_argument("'content' is required"))?;

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.next += 1;
        let sequence = entries.next;
        let key = match get_str(params, "key") {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => format!("entry-{}", sequence),
        };
        let replaced = entries
            .by_key
            .insert(key.clone(), Entry { sequence, content })
            .is_some();

        Ok(json!({"key": key, "stored": true, "replaced": replaced}))
    }

    pub fn recall(&self, params: &Map<String, Value>) -> Result<Value, ToolError> {
        let query = params
            .get("query")
            .map(|q| as_text(q).to_lowercase())
            .ok_or_else(|| ToolError::invalid_argument("'query' is required"))?;
        let limit = get_usize(params, "limit").unwrap_or(DEFAULT_RECALL_LIMIT);

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<(&String, &Entry)> = entries
            .by_key
            .iter()
            .filter(|(key, entry)| {
                query.is_empty()
                    || key.to_lowercase().contains(&query)
                    || as_text(&entry.content).to_lowercase().contains(&query)
            })
            .collect();
        found.sort_by(|a, b| b.1.sequence.cmp(&a.1.sequence));

        let results: Vec<Value> = found
            .into_iter()
            .take(limit)
            .map(|(key, entry)| json!({"key": key, "content": entry.content}))
            .collect();

        Ok(json!({"query": query, "entries": results}))
    }
}
