//! Subprocess proxy channel
//!
//! Forwards a call by spawning the tool's declared command, writing the
//! (already translated) parameters to its stdin as one JSON document and
//! reading its stdout. Output that parses as JSON is returned as-is;
//! anything else becomes a string payload. Response normalization is left
//! to the router.
//!
//! | Outcome | Tool error |
//! |---------|------------|
//! | executable missing | `NOT_FOUND` |
//! | spawn not permitted | `PERMISSION_DENIED` |
//! | non-zero exit | `EXECUTION_FAILED`, stderr as details |
//! | no exit within the tool's timeout | `TIMEOUT` |
//! | stdout over 1 MB | `EXECUTION_FAILED` |

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use toolweave_application::ProxyChannel;
use toolweave_domain::{ProviderError, ToolDefinition, ToolError};
use tracing::{debug, warn};

use crate::config::FileProxyConfig;

/// Maximum stdout kept from one invocation (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Used when a tool declares no timeout; the executor's per-call timeout
/// normally fires first
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// One command exposed as a proxy tool
#[derive(Debug, Clone)]
pub struct CommandTool {
    pub definition: ToolDefinition,
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl CommandTool {
    pub fn new(definition: ToolDefinition, command: impl Into<String>) -> Self {
        Self {
            definition,
            command: command.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn resolves(&self) -> bool {
        if self.command.contains(std::path::MAIN_SEPARATOR) {
            Path::new(&self.command).is_file()
        } else {
            which::which(&self.command).is_ok()
        }
    }
}

/// Proxy channel backed by local subprocesses
#[derive(Debug, Clone)]
pub struct CommandProxyChannel {
    id: String,
    tools: BTreeMap<String, CommandTool>,
    working_dir: Option<PathBuf>,
}

impl CommandProxyChannel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tools: BTreeMap::new(),
            working_dir: None,
        }
    }

    /// Build the channel from `[proxy]` configuration
    pub fn from_config(config: &FileProxyConfig) -> Self {
        config.tools.iter().fold(Self::new(&config.id), |channel, tool| {
            let mut command = CommandTool::new(tool.to_definition(), &tool.command)
                .with_args(tool.args.iter().cloned());
            if let Some(ms) = tool.timeout_ms {
                command = command.with_timeout(Duration::from_millis(ms));
            }
            channel.with_tool(command)
        })
    }

    pub fn with_tool(mut self, tool: CommandTool) -> Self {
        self.tools.insert(tool.definition.name.clone(), tool);
        self
    }

    /// Directory the commands run in
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    async fn run(
        &self,
        tool: &CommandTool,
        params: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let mut command = Command::new(&tool.command);
        command
            .args(&tool.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&tool.command, e))?;

        // Input is fed while stdout is drained so neither pipe can fill up
        let stdin = child.stdin.take();
        let input = Value::Object(params.clone()).to_string();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(input.as_bytes()).await {
                // A command that ignores its input may exit before reading it
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };
        let exchange = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed.map_err(|e| {
                ToolError::execution_failed(format!(
                    "Failed to write input to '{}': {}",
                    tool.command, e
                ))
            })?;
            output.map_err(|e| {
                ToolError::execution_failed(format!("Failed to wait for '{}': {}", tool.command, e))
            })
        };

        let timeout = tool.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let output = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| {
                ToolError::timeout(format!(
                    "command '{}' after {}ms",
                    tool.command,
                    timeout.as_millis()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("code {}", c));
            let error = ToolError::execution_failed(format!(
                "Command '{}' exited with {}",
                tool.command, code
            ));
            return Err(if stderr.is_empty() {
                error
            } else {
                error.with_details(stderr)
            });
        }

        parse_output(&tool.command, &output.stdout)
    }
}

fn spawn_error(command: &str, e: io::Error) -> ToolError {
    match e.kind() {
        io::ErrorKind::NotFound => ToolError::not_found(format!("command '{}'", command)),
        io::ErrorKind::PermissionDenied => {
            ToolError::permission_denied(format!("command '{}'", command))
        }
        _ => ToolError::execution_failed(format!("Failed to start '{}': {}", command, e)),
    }
}

/// JSON when stdout parses as JSON, otherwise the trimmed text
///
/// Output over [`MAX_OUTPUT_SIZE`] is a failure; a cut-off document would
/// otherwise pass as a text payload.
fn parse_output(command: &str, stdout: &[u8]) -> Result<Value, ToolError> {
    if stdout.len() > MAX_OUTPUT_SIZE {
        return Err(ToolError::execution_failed(format!(
            "Output of '{}' exceeds {} bytes",
            command, MAX_OUTPUT_SIZE
        ))
        .with_details(format!("{} bytes received", stdout.len())));
    }
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

#[async_trait]
impl ProxyChannel for CommandProxyChannel {
    fn id(&self) -> &str {
        &self.id
    }

    /// Every declared command must resolve to an executable
    async fn is_available(&self) -> bool {
        match self.tools.values().find(|t| !t.resolves()) {
            Some(missing) => {
                warn!(
                    channel = %self.id,
                    tool = %missing.definition.name,
                    command = %missing.command,
                    "Proxy command not found"
                );
                false
            }
            None => true,
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        Ok(self.tools.values().map(|t| t.definition.clone()).collect())
    }

    async fn forward(&self, name: &str, params: &Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("proxy tool '{}'", name)))?;

        let started = Instant::now();
        let result = self.run(tool, params).await;
        debug!(
            channel = %self.id,
            tool = name,
            command = %tool.command,
            success = result.is_ok(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Forwarded call"
        );
        result
    }
}
