//! Plan domain module
//!
//! A [`Plan`] is a finite DAG of [`ToolCall`]s kept in declared order. Every
//! plan must pass [`validation`] before it may execute; composition happens
//! through [`merge`]; dependencies' results flow into parameters through
//! [`substitution`]; plans travel between processes as [`snapshot`]s.
//!
//! ```text
//!   search ──▶ store ──▶ notify        levels: [search] [store] [notify]
//!
//!        ┌──▶ fetch ──┐
//!   search            ├──▶ store       levels: [search] [fetch, read] [store]
//!        └──▶ read  ──┘
//! ```

pub mod entities;
pub mod merge;
pub mod snapshot;
pub mod substitution;
pub mod validation;

pub use entities::{CallId, Plan, PlanId, ToolCall};
pub use merge::{MergeMode, merge_plans};
pub use snapshot::{SnapshotError, export_plan, import_plan};
pub use substitution::{ResultLookup, SubstitutionError, substitute};
pub use validation::PlanValidationError;
