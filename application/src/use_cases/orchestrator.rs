//! Orchestrator use case
//!
//! Wires catalog, discovery, planner, router and executor together and
//! exposes the three host entry points:
//!
//! | Entry point | Does |
//! |-------------|------|
//! | [`Orchestrator::refresh_catalog`] | query all sources, swap the catalog |
//! | [`Orchestrator::build_and_validate_plan`] | intent → validated plan |
//! | [`Orchestrator::execute_plan`] | plan → execution report |
//!
//! Several plans may execute concurrently on one orchestrator; they share
//! only the catalog and the breaker registry.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolweave_domain::{
    CapabilityVocabulary, Categorizer, CircuitState, ExecutionReport, ExecutionState, Plan,
    PlanValidationError, SnapshotError,
};
use tracing::warn;

use crate::catalog::{Catalog, CatalogSnapshot, CatalogStats};
use crate::config::EngineConfig;
use crate::discovery::{DiscoveryEngine, DiscoveryError, RefreshOutcome, SourceRegistry};
use crate::executor::Executor;
use crate::planner::{DependencyHints, Planner, PlanningError};
use crate::ports::event_sink::{CompositeEventSink, EventSink, NoEventSink};
use crate::ports::internal_registry::InternalToolRegistry;
use crate::ports::proxy_channel::ProxyChannel;
use crate::resilience::BreakerRegistry;
use crate::router::HybridRouter;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("Invalid plan: {0}")]
    Validation(#[from] PlanValidationError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

pub struct Orchestrator {
    catalog: Arc<Catalog>,
    discovery: DiscoveryEngine,
    planner: Planner,
    executor: Executor,
    breakers: Arc<BreakerRegistry>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Re-query every source and swap the catalog
    pub async fn refresh_catalog(&self, force: bool) -> Result<RefreshOutcome, OrchestratorError> {
        Ok(self.discovery.refresh(force).await?)
    }

    /// Build a plan for `intent` against the current catalog
    ///
    /// The catalog is refreshed first (the cache applies). A failed refresh
    /// is only fatal when there is no earlier catalog to plan against.
    pub async fn build_and_validate_plan(
        &self,
        intent: &str,
        hints: Option<&DependencyHints>,
    ) -> Result<Plan, OrchestratorError> {
        if let Err(e) = self.discovery.refresh(false).await {
            if self.catalog.snapshot().is_empty() {
                return Err(e.into());
            }
            warn!(error = %e, "Catalog refresh failed, planning against the previous catalog");
        }
        Ok(self
            .planner
            .build_plan(intent, &self.catalog.snapshot(), hints)?)
    }

    pub async fn execute_plan(
        &self,
        plan: &Plan,
        cancel: CancellationToken,
    ) -> Result<ExecutionReport, OrchestratorError> {
        Ok(self.executor.execute(plan, cancel).await?)
    }

    /// Re-execute `plan`, keeping the calls that succeeded in `previous`
    pub async fn resume_plan(
        &self,
        plan: &Plan,
        previous: &ExecutionState,
        cancel: CancellationToken,
    ) -> Result<ExecutionReport, OrchestratorError> {
        Ok(self.executor.resume(plan, previous, cancel).await?)
    }

    pub fn catalog(&self) -> Arc<CatalogSnapshot> {
        self.catalog.snapshot()
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog.snapshot().stats()
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn breaker_state(&self, tool: &str) -> CircuitState {
        self.breakers.state(tool)
    }

    pub fn export_plan(&self, plan: &Plan) -> Result<String, OrchestratorError> {
        Ok(self.planner.export(plan)?)
    }

    pub fn import_plan(&self, text: &str) -> Result<Plan, OrchestratorError> {
        let plan = self.planner.import(text)?;
        plan.validate()?;
        Ok(plan)
    }
}

/// Builder collecting sources, sinks and configuration
#[derive(Default)]
pub struct OrchestratorBuilder {
    sources: SourceRegistry,
    sinks: Vec<Arc<dyn EventSink>>,
    config: EngineConfig,
    categorizer: Option<Categorizer>,
    vocabulary: Option<CapabilityVocabulary>,
}

impl OrchestratorBuilder {
    /// Register an internal registry; registration order decides name conflicts
    pub fn internal(mut self, registry: Arc<dyn InternalToolRegistry>) -> Self {
        self.sources = self.sources.with_internal(registry);
        self
    }

    pub fn proxy(mut self, channel: Arc<dyn ProxyChannel>) -> Self {
        self.sources = self.sources.with_proxy(channel);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn categorizer(mut self, categorizer: Categorizer) -> Self {
        self.categorizer = Some(categorizer);
        self
    }

    pub fn vocabulary(mut self, vocabulary: CapabilityVocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn build(self) -> Orchestrator {
        let events: Arc<dyn EventSink> = match self.sinks.len() {
            0 => Arc::new(NoEventSink),
            1 => self.sinks[0].clone(),
            _ => Arc::new(CompositeEventSink::new(self.sinks)),
        };
        let vocabulary = self.vocabulary.unwrap_or_default();
        let catalog = Arc::new(Catalog::new(
            self.categorizer.unwrap_or_default(),
            vocabulary.clone(),
        ));
        let sources = Arc::new(self.sources);
        let breakers = Arc::new(BreakerRegistry::new(self.config.breaker, events.clone()));
        let router = Arc::new(HybridRouter::new(sources.clone(), breakers.clone()));

        Orchestrator {
            discovery: DiscoveryEngine::new(
                sources,
                catalog.clone(),
                events.clone(),
                self.config.discovery,
            ),
            planner: Planner::new(vocabulary),
            executor: Executor::new(router, catalog.clone(), events, self.config.execution),
            catalog,
            breakers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, RecordingEventSink, ScriptedProxyChannel, ScriptedRegistry};
    use serde_json::json;
    use toolweave_domain::{PlanStatus, ToolDefinition};

    fn orchestrator(events: Arc<RecordingEventSink>) -> Orchestrator {
        Orchestrator::builder()
            .internal(Arc::new(ScriptedRegistry::new("builtin").with_tool(
                ToolDefinition::new("web_search", "Search the web").with_capability("search"),
                Behavior::Return(json!(["https://example.com"])),
            )))
            .proxy(Arc::new(ScriptedProxyChannel::new("archive").with_tool(
                ToolDefinition::new("archive", "Store a document").with_capability("store"),
                Behavior::Echo,
            )))
            .event_sink(events)
            .build()
    }

    #[tokio::test]
    async fn test_entry_points() {
        let events = Arc::new(RecordingEventSink::new());
        let orchestrator = orchestrator(events.clone());

        let outcome = orchestrator.refresh_catalog(true).await.unwrap();
        assert_eq!(outcome.tool_count, 2);

        let plan = orchestrator
            .build_and_validate_plan("search and store the results", None)
            .await
            .unwrap();
        assert_eq!(plan.len(), 2);

        let report = orchestrator
            .execute_plan(&plan, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.plan_status, PlanStatus::Completed);
        assert_eq!(
            report.call("archive").unwrap().payload,
            Some(json!({"input": ["https://example.com"]}))
        );

        assert_eq!(orchestrator.stats().proxy_tools, 1);
        assert_eq!(orchestrator.breaker_state("archive"), CircuitState::Closed);
        assert!(events.count("call_finished") == 2);
    }

    #[tokio::test]
    async fn test_build_refreshes_lazily() {
        let events = Arc::new(RecordingEventSink::new());
        let orchestrator = orchestrator(events.clone());

        orchestrator
            .build_and_validate_plan("search", None)
            .await
            .unwrap();
        orchestrator
            .build_and_validate_plan("store", None)
            .await
            .unwrap();
        // Second build reused the cached refresh
        assert_eq!(events.count("catalog_refreshed"), 1);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_plan() {
        let orchestrator = orchestrator(Arc::new(RecordingEventSink::new()));
        let plan = Plan::new("p", "").with_call(
            toolweave_domain::ToolCall::new("a", "web_search").depends_on("a"),
        );
        let text = orchestrator.export_plan(&plan).unwrap();

        assert!(matches!(
            orchestrator.import_plan(&text),
            Err(OrchestratorError::Validation(
                PlanValidationError::CircularDependency { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_no_sources() {
        let orchestrator = Orchestrator::builder().build();
        assert!(matches!(
            orchestrator.build_and_validate_plan("search", None).await,
            Err(OrchestratorError::Discovery(DiscoveryError::NoSources))
        ));
    }
}
