//! Built-in tool registry
//!
//! Exposes the file, search and knowledge-store tools as an internal
//! registry. Relative paths resolve against the configured working
//! directory. File-system tools run on the blocking pool.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolweave_application::InternalToolRegistry;
use toolweave_domain::{ProviderError, ToolDefinition, ToolError};
use tracing::debug;

use crate::tools::memory::{self, KnowledgeStore};
use crate::tools::{file, search};

/// Source ID of the built-in registry
pub const BUILTIN_ID: &str = "builtin";

type FsTool = fn(&Path, &Map<String, Value>) -> Result<Value, ToolError>;

/// Built-in tool registry
#[derive(Debug, Clone)]
pub struct BuiltinToolRegistry {
    root: PathBuf,
    knowledge: Option<Arc<KnowledgeStore>>,
}

impl BuiltinToolRegistry {
    /// Create a registry with all tools, rooted at the current directory
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            knowledge: Some(Arc::new(KnowledgeStore::new())),
        }
    }

    /// Set the directory relative paths resolve against
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root = dir.into();
        self
    }

    /// Drop the knowledge-store tools
    pub fn without_knowledge_store(mut self) -> Self {
        self.knowledge = None;
        self
    }

    pub fn knowledge_store(&self) -> Option<&Arc<KnowledgeStore>> {
        self.knowledge.as_ref()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = vec![
            file::read_file_definition(),
            file::write_file_definition(),
            file::list_directory_definition(),
            search::glob_search_definition(),
            search::grep_search_definition(),
        ];
        if self.knowledge.is_some() {
            definitions.push(memory::memory_store_definition());
            definitions.push(memory::memory_recall_definition());
        }
        definitions
    }

    fn fs_tool(name: &str) -> Option<FsTool> {
        let tool: FsTool = match name {
            file::READ_FILE => file::execute_read_file,
            file::WRITE_FILE => file::execute_write_file,
            file::LIST_DIRECTORY => file::execute_list_directory,
            search::GLOB_SEARCH => search::execute_glob_search,
            search::GREP_SEARCH => search::execute_grep_search,
            _ => return None,
        };
        Some(tool)
    }
}

impl Default for BuiltinToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InternalToolRegistry for BuiltinToolRegistry {
    fn id(&self) -> &str {
        BUILTIN_ID
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(self.definitions())
    }

    async fn invoke(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError> {
        debug!(tool = name, root = %self.root.display(), "Invoking built-in tool");

        if let Some(tool) = Self::fs_tool(name) {
            let root = self.root.clone();
            let params = params.clone();
            return tokio::task::spawn_blocking(move || tool(&root, &params))
                .await
                .map_err(|e| ToolError::execution_failed(format!("Tool task failed: {}", e)))?;
        }

        match (name, &self.knowledge) {
            (memory::MEMORY_STORE, Some(store)) => store.store(params),
            (memory::MEMORY_RECALL, Some(store)) => store.recall(params),
            _ => Err(ToolError::not_found(format!("tool '{}'", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_list_tools() {
        let registry = BuiltinToolRegistry::new();
        let tools = registry.list_tools().await.unwrap();

        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "read_file",
                "write_file",
                "list_directory",
                "glob_search",
                "grep_search",
                "memory_store",
                "memory_recall"
            ]
        );
        assert!(tools.iter().all(|t| !t.capabilities.is_empty()));
    }

    #[tokio::test]
    async fn test_without_knowledge_store() {
        let registry = BuiltinToolRegistry::new().without_knowledge_store();
        let tools = registry.list_tools().await.unwrap();
        assert!(tools.iter().all(|t| !t.name.starts_with("memory_")));

        let err = registry
            .invoke("memory_store", &params(json!({"content": "x"})))
            .await
            .unwrap_err();
        assert_eq!(err.code, ToolError::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invoke_resolves_against_working_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "remember the milk").unwrap();
        let registry = BuiltinToolRegistry::new().with_working_dir(dir.path());

        let result = registry
            .invoke("read_file", &params(json!({"path": "notes.txt"})))
            .await
            .unwrap();
        assert_eq!(result["content"], "remember the milk");
    }

    #[tokio::test]
    async fn test_knowledge_store_roundtrip() {
        let registry = BuiltinToolRegistry::new();
        registry
            .invoke("memory_store", &params(json!({"key": "k", "content": "value"})))
            .await
            .unwrap();

        let result = registry
            .invoke("memory_recall", &params(json!({"query": "val"})))
            .await
            .unwrap();
        assert_eq!(result["entries"][0]["key"], "k");
        assert_eq!(registry.knowledge_store().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = BuiltinToolRegistry::new();
        let err = registry.invoke("teleport", &Map::new()).await.unwrap_err();
        assert_eq!(err.code, ToolError::NOT_FOUND);
    }
}
