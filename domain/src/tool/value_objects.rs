//! Tool domain value objects: immutable result and error types
//!
//! These types form the **output side** of every dispatch, whichever path
//! (internal or proxy) served it. Both paths are normalized into the same
//! canonical [`ToolResult`] shape: `{ success, payload, error }`.
//!
//! Error codes in [`ToolError`] are the structured input to failure
//! classification (see [`crate::resilience::ErrorCategory`]):
//!
//! | Code | Category | Retryable? |
//! |------|----------|-----------|
//! | `NOT_FOUND` | NotFound | No |
//! | `INVALID_ARGUMENT` | InvalidParameters | No |
//! | `PERMISSION_DENIED` | PermissionDenied | No |
//! | `TIMEOUT`, `UNAVAILABLE`, `CIRCUIT_OPEN` | TransientIo | Yes |
//! | `EXECUTION_FAILED`, `REMOTE_ERROR` | RemoteExecutionError | Yes |

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error that occurred during tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "PERMISSION_DENIED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";
    pub const PERMISSION_DENIED: &'static str = "PERMISSION_DENIED";
    pub const TIMEOUT: &'static str = "TIMEOUT";
    pub const UNAVAILABLE: &'static str = "UNAVAILABLE";
    pub const CIRCUIT_OPEN: &'static str = "CIRCUIT_OPEN";
    pub const EXECUTION_FAILED: &'static str = "EXECUTION_FAILED";
    pub const REMOTE_ERROR: &'static str = "REMOTE_ERROR";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Common error constructors
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            Self::NOT_FOUND,
            format!("Resource not found: {}", resource.into()),
        )
    }

    pub fn permission_denied(resource: impl Into<String>) -> Self {
        Self::new(
            Self::PERMISSION_DENIED,
            format!("Permission denied: {}", resource.into()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_ARGUMENT, message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(Self::EXECUTION_FAILED, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Self::UNAVAILABLE, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(Self::REMOTE_ERROR, message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            Self::TIMEOUT,
            format!("Operation timed out: {}", operation.into()),
        )
    }

    pub fn circuit_open(tool: impl Into<String>) -> Self {
        Self::new(
            Self::CIRCUIT_OPEN,
            format!("Circuit open for tool: {}", tool.into()),
        )
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Canonical result of a dispatch.
///
/// A result may carry both a payload and an error: a proxy call that
/// returned data but flagged an application-level failure is surfaced as
/// `success == false` with the partial payload preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that produced the result
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Result payload (full on success, partial on some failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Error information (for failed execution)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Metadata about the execution
    #[serde(default)]
    pub metadata: ToolResultMetadata,
}

/// Structured metadata about tool execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMetadata {
    /// Duration of execution in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Number of bytes processed/returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    /// For search operations: number of matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            payload: Some(payload.into()),
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            payload: None,
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Create a failed result that still carries the data the tool returned
    pub fn partial(tool_name: impl Into<String>, payload: Value, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            payload: Some(payload),
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    /// Add metadata to the result
    pub fn with_metadata(mut self, metadata: ToolResultMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add duration metadata
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata.duration_ms = Some(duration_ms);
        self
    }

    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get the payload
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Get the error
    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Error rendered as plain text (the `rawError` of the canonical shape)
    pub fn raw_error(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_error() {
        let err = ToolError::not_found("/path/to/file").with_details("File does not exist");

        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.message.contains("/path/to/file"));
        assert_eq!(
            err.to_string(),
            "[NOT_FOUND] Resource not found: /path/to/file (File does not exist)"
        );
    }

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("search", json!({"hits": 3})).with_duration(12);

        assert!(result.is_success());
        assert_eq!(result.payload(), Some(&json!({"hits": 3})));
        assert!(result.error().is_none());
        assert!(result.raw_error().is_none());
        assert_eq!(result.metadata.duration_ms, Some(12));
    }

    #[test]
    fn test_tool_result_failure() {
        let result = ToolResult::failure("write_file", ToolError::permission_denied("/etc/passwd"));

        assert!(!result.is_success());
        assert!(result.payload().is_none());
        assert_eq!(result.error().unwrap().code, "PERMISSION_DENIED");
        assert!(result.raw_error().unwrap().contains("/etc/passwd"));
    }

    #[test]
    fn test_tool_result_partial_keeps_payload() {
        let result = ToolResult::partial(
            "store",
            json!({"written": 2}),
            ToolError::remote("quota exceeded"),
        );

        assert!(!result.is_success());
        assert_eq!(result.payload(), Some(&json!({"written": 2})));
        assert_eq!(result.error().unwrap().code, ToolError::REMOTE_ERROR);
    }
}
