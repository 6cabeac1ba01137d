//! Failure classification
//!
//! Every failed attempt is classified into a closed taxonomy that drives
//! retry and fallback policy. Structured error codes are trusted first; only
//! when the code is unrecognized does classification fall back to pattern
//! matching on the error text.

use serde::{Deserialize, Serialize};

use crate::tool::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NotFound,
    InvalidParameters,
    /// Network or timeout-like failure
    TransientIo,
    RemoteExecutionError,
    PermissionDenied,
    Unknown,
}

impl ErrorCategory {
    /// Whether a failure of this class may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::TransientIo | ErrorCategory::RemoteExecutionError
        )
    }

    /// Whether a failure of this class counts against the tool's breaker
    ///
    /// A bad parameter says nothing about the tool's health.
    pub fn trips_breaker(&self) -> bool {
        !matches!(self, ErrorCategory::InvalidParameters)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::InvalidParameters => "invalid_parameters",
            ErrorCategory::TransientIo => "transient_io",
            ErrorCategory::RemoteExecutionError => "remote_execution_error",
            ErrorCategory::PermissionDenied => "permission_denied",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Classify a tool error: structured code first, then message text
    pub fn classify(error: &ToolError) -> Self {
        Self::from_code(&error.code).unwrap_or_else(|| {
            let mut text = error.message.to_lowercase();
            if let Some(details) = &error.details {
                text.push(' ');
                text.push_str(&details.to_lowercase());
            }
            Self::from_text(&text)
        })
    }

    fn from_code(code: &str) -> Option<Self> {
        let category = match code {
            ToolError::NOT_FOUND => ErrorCategory::NotFound,
            ToolError::INVALID_ARGUMENT => ErrorCategory::InvalidParameters,
            ToolError::PERMISSION_DENIED => ErrorCategory::PermissionDenied,
            ToolError::TIMEOUT | ToolError::UNAVAILABLE | ToolError::CIRCUIT_OPEN => {
                ErrorCategory::TransientIo
            }
            ToolError::EXECUTION_FAILED | ToolError::REMOTE_ERROR => {
                ErrorCategory::RemoteExecutionError
            }
            _ => return None,
        };
        Some(category)
    }

    fn from_text(text: &str) -> Self {
        const PATTERNS: &[(ErrorCategory, &[&str])] = &[
            (
                ErrorCategory::TransientIo,
                &[
                    "timed out",
                    "timeout",
                    "connection",
                    "unavailable",
                    "temporarily",
                    "broken pipe",
                    "reset by peer",
                    "try again",
                    "rate limit",
                ],
            ),
            (
                ErrorCategory::PermissionDenied,
                &["permission denied", "forbidden", "unauthorized", "access denied"],
            ),
            (
                ErrorCategory::NotFound,
                &["not found", "no such", "does not exist", "unknown tool"],
            ),
            (
                ErrorCategory::InvalidParameters,
                &["invalid", "missing required", "malformed", "must be"],
            ),
            (
                ErrorCategory::RemoteExecutionError,
                &["failed", "error", "exception", "exit status"],
            ),
        ];

        PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| text.contains(p)))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Unknown)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
