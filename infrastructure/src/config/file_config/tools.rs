//! Tool source configuration from TOML (`[builtin]` and `[proxy]` sections)
//!
//! Proxy tools register external commands as tools reached through the
//! subprocess proxy channel. Each declares how canonical parameter keys map
//! onto the command's own input document and where its payload and failure
//! signal live in the JSON it prints.
//!
//! Example configuration:
//!
//! ```toml
//! [builtin]
//! enabled = true
//! working_dir = "."
//! knowledge_store = true
//!
//! [proxy]
//! id = "commands"
//!
//! [[proxy.tools]]
//! name = "chat_notify"
//! description = "Post a message to the team channel"
//! command = "chat-cli"
//! args = ["post", "--json"]
//! capabilities = ["notify"]
//! timeout_ms = 5000
//! mappings = [{ from = "input", to = "text" }]
//!
//! [[proxy.tools.parameters]]
//! name = "input"
//! description = "Message text"
//!
//! [proxy.tools.response]
//! payload_pointer = "/result"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toolweave_domain::{
    ParamMapping, ParamType, ParameterSchema, ResponseMapping, ToolDefinition, ToolParameter,
};

/// Raw `[builtin]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBuiltinConfig {
    /// Whether the built-in registry is registered at all
    pub enabled: bool,
    /// Root that relative file paths resolve against (current directory when unset)
    pub working_dir: Option<PathBuf>,
    /// Expose `memory_store` / `memory_recall`
    pub knowledge_store: bool,
}

impl Default for FileBuiltinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            working_dir: None,
            knowledge_store: true,
        }
    }
}

/// One declared parameter of a proxy tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProxyParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether this parameter is required (default: true)
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
}

fn default_true() -> bool {
    true
}

/// One `[[proxy.tools]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProxyToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Executable, resolved through `PATH` unless it contains a separator
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Capability tags; derived from name and description when empty
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<FileProxyParameter>,
    #[serde(default)]
    pub mappings: Vec<ParamMapping>,
    /// Reject parameters without a mapping instead of passing them through
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub response: ResponseMapping,
    /// Upper bound on one invocation of the command
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl FileProxyToolConfig {
    /// Definition announced by the proxy channel for this tool
    pub fn to_definition(&self) -> ToolDefinition {
        let mut schema = self
            .mappings
            .iter()
            .cloned()
            .fold(ParameterSchema::default(), ParameterSchema::with_mapping)
            .with_response(self.response.clone());
        if self.strict {
            schema = schema.strict();
        }

        self.parameters
            .iter()
            .fold(
                ToolDefinition::new(&self.name, &self.description)
                    .with_capabilities(self.capabilities.iter().cloned())
                    .with_schema(schema),
                |def, p| {
                    def.with_parameter(
                        ToolParameter::new(&p.name, &p.description, p.required)
                            .with_type(p.param_type),
                    )
                },
            )
    }
}

/// Raw `[proxy]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProxyConfig {
    /// Source ID of the subprocess channel
    pub id: String,
    pub tools: Vec<FileProxyToolConfig>,
}

impl Default for FileProxyConfig {
    fn default() -> Self {
        Self {
            id: "commands".to_string(),
            tools: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROXY_TOML: &str = r#"
[proxy]
id = "ops"

[[proxy.tools]]
name = "chat_notify"
description = "Post a message"
command = "chat-cli"
args = ["post"]
capabilities = ["notify"]
timeout_ms = 5000
mappings = [{ from = "input", to = "text" }, { from = "count", to = "n", convert = "integer" }]
strict = true

[[proxy.tools.parameters]]
name = "input"
description = "Message text"

[[proxy.tools.parameters]]
name = "count"
required = false
type = "integer"

[proxy.tools.response]
payload_pointer = "/result"
"#;

    #[test]
    fn test_builtin_defaults() {
        let config = FileBuiltinConfig::default();
        assert!(config.enabled);
        assert!(config.knowledge_store);
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn test_proxy_tools_deserialize() {
        let config: super::super::FileConfig = toml::from_str(PROXY_TOML).unwrap();
        assert_eq!(config.proxy.id, "ops");
        assert_eq!(config.proxy.tools.len(), 1);

        let tool = &config.proxy.tools[0];
        assert_eq!(tool.command, "chat-cli");
        assert_eq!(tool.timeout_ms, Some(5000));
        assert!(tool.parameters[0].required);
        assert_eq!(tool.parameters[0].param_type, ParamType::Any);
        assert!(!tool.parameters[1].required);
        assert_eq!(tool.mappings[1].convert, Some(ParamType::Integer));
        assert_eq!(tool.response.payload_pointer.as_deref(), Some("/result"));
        // Unset pointers keep their defaults
        assert_eq!(tool.response.error_flag_pointer.as_deref(), Some("/isError"));
    }

    #[test]
    fn test_to_definition() {
        let config: super::super::FileConfig = toml::from_str(PROXY_TOML).unwrap();
        let def = config.proxy.tools[0].to_definition();

        assert_eq!(def.name, "chat_notify");
        assert!(def.capabilities.contains("notify"));
        assert_eq!(def.parameters.len(), 2);
        let schema = def.schema.unwrap();
        assert_eq!(schema.mappings.len(), 2);
        assert!(!schema.pass_through);
    }
}
