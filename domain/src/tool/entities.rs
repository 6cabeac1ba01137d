//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::category::ToolCategory;
use super::performance::PerformanceRecord;
use super::schema::{ParamType, ParameterSchema};

/// How a tool is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Invoked directly within this process
    Internal,
    /// Forwarded through a proxy channel
    Proxy,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Internal => "internal",
            SourceKind::Proxy => "proxy",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Declared type
    #[serde(default)]
    pub param_type: ParamType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// A tool as announced by its source, before it enters the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool within its source (e.g., "read_file")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Parameter specifications
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Declared capability tags (canonicalized when the catalog is built)
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Declared parameter/response schema (proxy tools)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParameterSchema>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            capabilities: BTreeSet::new(),
            schema: None,
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_capability(mut self, tag: impl Into<String>) -> Self {
        self.capabilities.insert(tag.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Catalog entry for one tool
///
/// Identity (name, source, kind) is fixed once the descriptor is built; only
/// the performance record changes, and only through the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    /// Identifier of the owning source
    pub source: String,
    pub kind: SourceKind,
    pub description: String,
    pub category: ToolCategory,
    pub capabilities: BTreeSet<String>,
    pub parameters: Vec<ToolParameter>,
    pub schema: ParameterSchema,
    pub performance: PerformanceRecord,
}

impl ToolDescriptor {
    /// Build a descriptor from a definition announced by `source`
    ///
    /// Category and canonical capabilities are computed by the caller so the
    /// categorization table and vocabulary stay configurable.
    pub fn from_definition(
        definition: ToolDefinition,
        source: impl Into<String>,
        kind: SourceKind,
        category: ToolCategory,
        capabilities: BTreeSet<String>,
    ) -> Self {
        Self {
            name: definition.name,
            source: source.into(),
            kind,
            description: definition.description,
            category,
            capabilities,
            parameters: definition.parameters,
            schema: definition.schema.unwrap_or_default(),
            performance: PerformanceRecord::default(),
        }
    }

    pub fn is_proxy(&self) -> bool {
        self.kind == SourceKind::Proxy
    }

    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.contains(tag)
    }

    /// Capability tags shared with another descriptor
    pub fn shared_capabilities<'a>(&'a self, other: &'a ToolDescriptor) -> Vec<&'a str> {
        self.capabilities
            .intersection(&other.capabilities)
            .map(String::as_str)
            .collect()
    }

    /// View of this descriptor as a definition (for parameter validation)
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            capabilities: self.capabilities.clone(),
            schema: Some(self.schema.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, tags: &[&str]) -> ToolDescriptor {
        ToolDescriptor::from_definition(
            ToolDefinition::new(name, "test tool"),
            "src",
            SourceKind::Internal,
            ToolCategory::Unknown,
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("read_file", "Read file contents")
            .with_parameter(ToolParameter::new("path", "File path to read", true))
            .with_capabilities(["read", "file"]);

        assert_eq!(tool.name, "read_file");
        assert_eq!(tool.parameters.len(), 1);
        assert!(tool.parameter("path").unwrap().required);
        assert!(tool.parameter("missing").is_none());
        assert_eq!(tool.capabilities.len(), 2);
    }

    #[test]
    fn test_descriptor_from_definition() {
        let def = ToolDefinition::new("store", "Store a document").with_capability("store");
        let desc = ToolDescriptor::from_definition(
            def,
            "proxy:docs",
            SourceKind::Proxy,
            ToolCategory::KnowledgeStore,
            ["store".to_string()].into_iter().collect(),
        );

        assert!(desc.is_proxy());
        assert_eq!(desc.source, "proxy:docs");
        assert_eq!(desc.performance.usage_count, 0);
        assert!(desc.schema.pass_through);
    }

    #[test]
    fn test_shared_capabilities() {
        let a = descriptor("a", &["search", "fetch"]);
        let b = descriptor("b", &["fetch", "store"]);
        let c = descriptor("c", &["notify"]);

        assert_eq!(a.shared_capabilities(&b), vec!["fetch"]);
        assert!(a.shared_capabilities(&c).is_empty());
        assert!(a.has_capability("search"));
    }

    #[test]
    fn test_source_kind_serialization() {
        assert_eq!(serde_json::to_string(&SourceKind::Proxy).unwrap(), "\"proxy\"");
        assert_eq!(SourceKind::Internal.to_string(), "internal");
    }
}
