//! Tool domain module
//!
//! Core abstractions for the **tool catalog**: what a tool is, how it is
//! categorized, which capabilities it offers, how its parameters are mapped
//! onto a proxy target, and what a dispatch returns.
//!
//! # Overview
//!
//! ```text
//! ┌────────────────┐  categorize   ┌────────────────┐  dispatch   ┌──────────────┐
//! │ ToolDefinition │──────────────▶│ ToolDescriptor │────────────▶│ ToolResult   │
//! │ (from source)  │  + vocabulary │ (catalog entry)│             │ (canonical)  │
//! └────────────────┘               └───────┬────────┘             └──────────────┘
//!                                          │
//!                                          ├─ category:     ToolCategory
//!                                          ├─ capabilities: canonical tags
//!                                          ├─ schema:       ParameterSchema
//!                                          └─ performance:  PerformanceRecord (EMA)
//! ```
//!
//! # Internal vs Proxy
//!
//! | Kind | Dispatch | Parameters | Response |
//! |------|----------|-----------|----------|
//! | **Internal** | registry `invoke` | validated against declared definition | payload or error |
//! | **Proxy** | channel `forward` | translated via [`ParameterSchema`] | normalized via [`ResponseMapping`](schema::ResponseMapping) |
//!
//! # Key Types
//!
//! - [`ToolDescriptor`]: Catalog entry (identity, category, tags, stats)
//! - [`Categorizer`]: Ordered, table-driven categorization
//! - [`CapabilityVocabulary`]: Word → capability tag table, scoring and ranking
//! - [`ParameterSchema`]: Declared per-tool key/type mappings
//! - [`ToolResult`] / [`ToolError`]: Canonical dispatch outcome
//! - [`ToolValidator`]: Pure parameter validation

pub mod capability;
pub mod category;
pub mod entities;
pub mod performance;
pub mod provider;
pub mod schema;
pub mod traits;
pub mod value_objects;

pub use capability::{CapabilityVocabulary, performance_order, rank, score};
pub use category::{Categorizer, CategoryRule, ToolCategory};
pub use entities::{SourceKind, ToolDefinition, ToolDescriptor, ToolParameter};
pub use performance::PerformanceRecord;
pub use provider::ProviderError;
pub use schema::{ParamMapping, ParamType, ParameterSchema, ResponseMapping};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolResult, ToolResultMetadata};
