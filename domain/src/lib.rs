//! Domain layer for toolweave
//!
//! This crate contains the core types and algorithms of the orchestration
//! engine. It has no dependencies on infrastructure or presentation concerns
//! and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A tool is a named, invokable capability. It is either **internal**
//! (invoked in-process) or a **proxy** (forwarded to an implementation
//! elsewhere). The catalog describes every tool with a [`ToolDescriptor`].
//!
//! ## Plans
//!
//! A [`Plan`] is a validated DAG of [`ToolCall`]s built for one task.
//!
//! ## Resilience
//!
//! Failures are classified into an [`ErrorCategory`] that drives retry,
//! breaker and fallback policy.

pub mod execution;
pub mod plan;
pub mod resilience;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use execution::{
    CallRecord, CallStatus, ExecutionEvent, ExecutionReport, ExecutionState, FallbackRecord,
    PlanStatus, RetriedCall, UnsatisfiedRecord,
};
pub use plan::{
    CallId, MergeMode, Plan, PlanId, PlanValidationError, ResultLookup, SnapshotError,
    SubstitutionError, ToolCall, export_plan, import_plan, merge_plans, substitute,
};
pub use resilience::{
    BackoffPolicy, BreakerConfig, CircuitBreaker, CircuitState, ErrorCategory, FailureOutcome,
    Rejection,
};
pub use tool::{
    CapabilityVocabulary, Categorizer, CategoryRule, DefaultToolValidator, ParamMapping,
    ParamType, ParameterSchema, PerformanceRecord, ProviderError, ResponseMapping, SourceKind,
    ToolCategory, ToolDefinition, ToolDescriptor, ToolError, ToolParameter, ToolResult,
    ToolResultMetadata, ToolValidator,
};
