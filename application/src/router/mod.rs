//! Hybrid router
//!
//! Routes one call to the internal registry or a proxy channel that owns
//! the tool:
//!
//! ```text
//! dispatch(call)
//!   ├─ not in catalog ──────────▶ ToolNotFound
//!   ├─ breaker rejects ─────────▶ CircuitOpen (tool not contacted)
//!   ├─ internal: validate ─▶ invoke ─────────────┐
//!   └─ proxy: translate ─▶ forward ─▶ normalize ─┴─▶ ToolResult
//! ```
//!
//! Tool-level failures come back as a failed [`ToolResult`]; the breaker is
//! updated with their classification. A [`DispatchError`] means no tool ran.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use toolweave_domain::{
    DefaultToolValidator, ErrorCategory, SubstitutionError, ToolCall, ToolDescriptor,
    ToolError, ToolResult, ToolValidator,
};
use tracing::{debug, trace};

use crate::catalog::CatalogSnapshot;
use crate::discovery::{DiscoverySource, SourceRegistry};
use crate::resilience::BreakerRegistry;

/// A call that could not be handed to any tool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Substitution failed: {0}")]
    Substitution(#[from] SubstitutionError),

    #[error("Circuit open for tool '{tool}' (retry in {retry_in_ms}ms)")]
    CircuitOpen { tool: String, retry_in_ms: u64 },

    #[error("Tool '{tool}' belongs to source '{source_id}', which is not registered")]
    SourceMissing { tool: String, source_id: String },
}

impl DispatchError {
    /// Equivalent tool error, for recording on the call
    pub fn to_tool_error(&self) -> ToolError {
        match self {
            DispatchError::ToolNotFound(name) => ToolError::not_found(format!("tool '{}'", name)),
            DispatchError::Substitution(e) => ToolError::invalid_argument(e.to_string()),
            DispatchError::CircuitOpen { tool, .. } => {
                ToolError::circuit_open(tool.clone()).with_details(self.to_string())
            }
            DispatchError::SourceMissing { .. } => ToolError::unavailable(self.to_string()),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::classify(&self.to_tool_error())
    }
}

pub struct HybridRouter {
    sources: Arc<SourceRegistry>,
    breakers: Arc<BreakerRegistry>,
    validator: DefaultToolValidator,
}

impl HybridRouter {
    pub fn new(sources: Arc<SourceRegistry>, breakers: Arc<BreakerRegistry>) -> Self {
        Self {
            sources,
            breakers,
            validator: DefaultToolValidator,
        }
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    /// Dispatch `call` with its already-substituted parameters
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        snapshot: &CatalogSnapshot,
        params: &Map<String, Value>,
    ) -> Result<ToolResult, DispatchError> {
        self.dispatch_to(&call.tool_name, snapshot, params).await
    }

    /// Dispatch to a named tool; used for planned tools and fallbacks alike
    pub async fn dispatch_to(
        &self,
        tool_name: &str,
        snapshot: &CatalogSnapshot,
        params: &Map<String, Value>,
    ) -> Result<ToolResult, DispatchError> {
        let descriptor = snapshot
            .lookup(tool_name)
            .ok_or_else(|| DispatchError::ToolNotFound(tool_name.to_string()))?;

        let source = self.sources.get(&descriptor.source).ok_or_else(|| {
            DispatchError::SourceMissing {
                tool: tool_name.to_string(),
                source_id: descriptor.source.clone(),
            }
        })?;

        self.breakers
            .try_acquire(tool_name)
            .map_err(|rejection| DispatchError::CircuitOpen {
                tool: tool_name.to_string(),
                retry_in_ms: BreakerRegistry::retry_in(&rejection).as_millis() as u64,
            })?;

        debug!(
            tool = tool_name,
            source = %descriptor.source,
            kind = descriptor.kind.as_str(),
            "Dispatching"
        );
        let started = Instant::now();
        let result = match source {
            DiscoverySource::Proxy(channel) => match descriptor.schema.translate(params) {
                Ok(translated) => {
                    let logged = Value::Object(translated.clone());
                    trace!(tool = tool_name, params = %logged, "Translated parameters");
                    match channel.forward(tool_name, &translated).await {
                        Ok(raw) => descriptor.schema.normalize_response(tool_name, raw),
                        Err(e) => ToolResult::failure(tool_name, e),
                    }
                }
                Err(e) => ToolResult::failure(tool_name, e),
            },
            DiscoverySource::Internal(registry) => match self.validate(&descriptor, params) {
                Ok(()) => match registry.invoke(tool_name, params).await {
                    Ok(payload) => ToolResult::success(tool_name, payload),
                    Err(e) => ToolResult::failure(tool_name, e),
                },
                Err(e) => ToolResult::failure(tool_name, e),
            },
        };
        let result = result.with_duration(started.elapsed().as_millis() as u64);

        match result.error() {
            None => self.breakers.record_success(tool_name),
            Some(error) => self
                .breakers
                .record_failure(tool_name, ErrorCategory::classify(error)),
        }
        Ok(result)
    }

    fn validate(
        &self,
        descriptor: &ToolDescriptor,
        params: &Map<String, Value>,
    ) -> Result<(), ToolError> {
        if descriptor.parameters.is_empty() {
            return Ok(());
        }
        self.validator.validate(params, &descriptor.definition())
    }
}
