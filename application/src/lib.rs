//! Application layer for toolweave
//!
//! This crate contains the tool catalog, discovery, planning, routing and
//! execution engines, the port definitions adapters implement, and the
//! engine configuration. It depends only on the domain layer.

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod executor;
pub mod planner;
pub mod ports;
pub mod resilience;
pub mod router;
pub mod testing;
pub mod use_cases;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogSnapshot, CatalogStats, NameConflict, SourceBatch};
pub use config::{DiscoveryParams, EngineConfig, ExecutionParams};
pub use discovery::{
    DiscoveryEngine, DiscoveryError, DiscoverySource, RefreshOutcome, SourceFailure,
    SourceRegistry,
};
pub use executor::Executor;
pub use planner::{DependencyHints, Planner, PlanningError};
pub use ports::{CompositeEventSink, EventSink, InternalToolRegistry, NoEventSink, ProxyChannel};
pub use resilience::BreakerRegistry;
pub use router::{DispatchError, HybridRouter};
pub use use_cases::orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorError};
