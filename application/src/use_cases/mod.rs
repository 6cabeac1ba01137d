//! Use cases
//!
//! Application-level operations that orchestrate the engine components.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorError};
