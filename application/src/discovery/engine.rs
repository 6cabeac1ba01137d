//! Catalog refresh
//!
//! ```text
//! refresh()
//!   ├─ cache fresh? ──yes──▶ cached outcome
//!   ├─ query every source concurrently (per-source timeout)
//!   ├─ all failed? ──yes──▶ AllSourcesFailed, old snapshot kept
//!   └─ build snapshot from answering sources, swap it in
//! ```
//!
//! A failing source never blocks the others: it is recorded in the outcome
//! and its tools are simply absent from the new snapshot.

use futures::future::join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;
use toolweave_domain::{ExecutionEvent, ProviderError};
use tracing::{debug, info, warn};

use super::source::{DiscoverySource, SourceRegistry};
use crate::catalog::{Catalog, SourceBatch};
use crate::config::DiscoveryParams;
use crate::ports::event_sink::EventSink;

/// One source that did not contribute to a refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: ProviderError,
}

/// Summary of a refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub tool_count: usize,
    pub sources_ok: Vec<String>,
    pub sources_failed: Vec<String>,
    pub failures: Vec<SourceFailure>,
    pub conflicts: usize,
    /// Served from the cache without querying any source
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("No discovery sources are registered")]
    NoSources,

    #[error("All {} discovery sources failed: {}", .failures.len(), describe(.failures))]
    AllSourcesFailed { failures: Vec<SourceFailure> },
}

fn describe(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.source, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct DiscoveryEngine {
    sources: Arc<SourceRegistry>,
    catalog: Arc<Catalog>,
    events: Arc<dyn EventSink>,
    params: DiscoveryParams,
    last: Mutex<Option<(Instant, RefreshOutcome)>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl DiscoveryEngine {
    pub fn new(
        sources: Arc<SourceRegistry>,
        catalog: Arc<Catalog>,
        events: Arc<dyn EventSink>,
        params: DiscoveryParams,
    ) -> Self {
        Self {
            sources,
            catalog,
            events,
            params,
            last: Mutex::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Query all sources and rebuild the catalog
    ///
    /// Within the cache TTL the previous outcome is returned unless `force`
    /// is set. Concurrent refreshes are serialized; a caller that waited for
    /// another refresh reuses its result.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, DiscoveryError> {
        if self.sources.is_empty() {
            return Err(DiscoveryError::NoSources);
        }

        if !force && let Some(cached) = self.cached() {
            return Ok(cached);
        }

        let _guard = self.refresh_lock.lock().await;
        if !force && let Some(cached) = self.cached() {
            return Ok(cached);
        }

        let timeout = self.params.source_timeout;
        let queries = self.sources.sources().iter().map(|source| async move {
            let result = match tokio::time::timeout(timeout, source.list_tools()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout.as_millis() as u64)),
            };
            (source, result)
        });
        let answers = join_all(queries).await;

        let mut batches = Vec::new();
        let mut sources_ok = Vec::new();
        let mut failures = Vec::new();
        for (source, result) in answers {
            match result {
                Ok(tools) => {
                    debug!(source = source.id(), tools = tools.len(), "Source answered");
                    sources_ok.push(source.id().to_string());
                    batches.push(batch(source, tools));
                }
                Err(error) => {
                    warn!(source = source.id(), error = %error, "Discovery source failed");
                    failures.push(SourceFailure {
                        source: source.id().to_string(),
                        error,
                    });
                }
            }
        }

        if batches.is_empty() {
            return Err(DiscoveryError::AllSourcesFailed { failures });
        }

        let snapshot = self.catalog.replace(batches);
        let outcome = RefreshOutcome {
            tool_count: snapshot.len(),
            sources_ok,
            sources_failed: failures.iter().map(|f| f.source.clone()).collect(),
            failures,
            conflicts: snapshot.conflicts().len(),
            cached: false,
        };

        info!(
            tools = outcome.tool_count,
            sources_ok = outcome.sources_ok.len(),
            sources_failed = outcome.sources_failed.len(),
            conflicts = outcome.conflicts,
            "Catalog refreshed"
        );
        self.events.record(&ExecutionEvent::CatalogRefreshed {
            tool_count: outcome.tool_count,
            sources_ok: outcome.sources_ok.clone(),
            sources_failed: outcome.sources_failed.clone(),
            conflicts: outcome.conflicts,
        });

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((Instant::now(), outcome.clone()));
        Ok(outcome)
    }

    /// Drop the cached outcome so the next refresh queries the sources
    pub fn invalidate(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self) -> Option<RefreshOutcome> {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let (at, outcome) = last.as_ref()?;
        if at.elapsed() >= self.params.cache_ttl {
            return None;
        }
        let mut outcome = outcome.clone();
        outcome.cached = true;
        Some(outcome)
    }
}

fn batch(source: &DiscoverySource, tools: Vec<toolweave_domain::ToolDefinition>) -> SourceBatch {
    SourceBatch {
        source: source.id().to_string(),
        kind: source.kind(),
        tools,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, RecordingEventSink, ScriptedProxyChannel, ScriptedRegistry};
    use serde_json::json;
    use std::time::Duration;
    use toolweave_domain::ToolDefinition;

    fn engine(
        sources: SourceRegistry,
        params: DiscoveryParams,
    ) -> (DiscoveryEngine, Arc<RecordingEventSink>) {
        let events = Arc::new(RecordingEventSink::new());
        let engine = DiscoveryEngine::new(
            Arc::new(sources),
            Arc::new(Catalog::default()),
            events.clone(),
            params,
        );
        (engine, events)
    }

    fn builtin() -> ScriptedRegistry {
        ScriptedRegistry::new("builtin")
            .with_tool(ToolDefinition::new("read_file", "Read a file"), Behavior::Echo)
    }

    fn web() -> ScriptedProxyChannel {
        ScriptedProxyChannel::new("web").with_tool(
            ToolDefinition::new("web_search", "Search the web"),
            Behavior::Return(json!({"results": []})),
        )
    }

    #[tokio::test]
    async fn test_one_unreachable_source_does_not_block_others() {
        let sources = SourceRegistry::new()
            .with_internal(Arc::new(builtin()))
            .with_proxy(Arc::new(web()))
            .with_proxy(Arc::new(
                ScriptedProxyChannel::new("chat")
                    .with_tool(ToolDefinition::new("notify", "Send a message"), Behavior::Echo)
                    .unavailable(),
            ));
        let (engine, events) = engine(sources, DiscoveryParams::default());

        let outcome = engine.refresh(false).await.unwrap();

        assert_eq!(outcome.tool_count, 2);
        assert_eq!(outcome.sources_ok, vec!["builtin", "web"]);
        assert_eq!(outcome.sources_failed, vec!["chat"]);
        assert!(matches!(
            outcome.failures[0].error,
            ProviderError::NotAvailable(_)
        ));
        assert!(engine.catalog().lookup("notify").is_none());
        assert_eq!(events.kinds(), vec!["catalog_refreshed"]);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        struct Stalled;

        #[async_trait::async_trait]
        impl crate::ports::internal_registry::InternalToolRegistry for Stalled {
            fn id(&self) -> &str {
                "stalled"
            }

            async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Vec::new())
            }

            async fn invoke(
                &self,
                name: &str,
                _params: &serde_json::Map<String, serde_json::Value>,
            ) -> Result<serde_json::Value, toolweave_domain::ToolError> {
                Err(toolweave_domain::ToolError::not_found(name))
            }
        }

        let sources = SourceRegistry::new()
            .with_internal(Arc::new(Stalled))
            .with_internal(Arc::new(builtin()));
        let params = DiscoveryParams {
            source_timeout: Duration::from_millis(20),
            ..DiscoveryParams::default()
        };
        let (engine, _) = engine(sources, params);

        let outcome = engine.refresh(true).await.unwrap();
        assert_eq!(outcome.sources_failed, vec!["stalled"]);
        assert_eq!(outcome.failures[0].error, ProviderError::Timeout(20));
        assert_eq!(outcome.tool_count, 1);
    }

    #[tokio::test]
    async fn test_all_sources_failing_keeps_previous_catalog() {
        let channel = Arc::new(web());
        let sources = SourceRegistry::new().with_proxy(channel.clone());
        let (engine, _) = engine(sources, DiscoveryParams::default());

        engine.refresh(true).await.unwrap();
        channel.set_available(false);

        let err = engine.refresh(true).await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::AllSourcesFailed { ref failures } if failures.len() == 1
        ));
        assert!(err.to_string().contains("web"));
        assert!(engine.catalog().lookup("web_search").is_some());
    }

    #[tokio::test]
    async fn test_cache_reused_within_ttl() {
        let sources = SourceRegistry::new().with_internal(Arc::new(builtin()));
        let (engine, events) = engine(sources, DiscoveryParams::default());

        assert!(!engine.refresh(false).await.unwrap().cached);
        assert!(engine.refresh(false).await.unwrap().cached);
        assert!(!engine.refresh(true).await.unwrap().cached);

        engine.invalidate();
        assert!(!engine.refresh(false).await.unwrap().cached);
        assert_eq!(events.count("catalog_refreshed"), 3);
    }

    #[tokio::test]
    async fn test_listing_failure_is_reported() {
        let sources = SourceRegistry::new()
            .with_internal(Arc::new(builtin().failing_listing()))
            .with_proxy(Arc::new(web()));
        let (engine, _) = engine(sources, DiscoveryParams::default());

        let outcome = engine.refresh(true).await.unwrap();
        assert_eq!(outcome.sources_failed, vec!["builtin"]);
        assert!(matches!(
            outcome.failures[0].error,
            ProviderError::DiscoveryFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_no_sources() {
        let (engine, _) = engine(SourceRegistry::new(), DiscoveryParams::default());
        assert_eq!(engine.refresh(false).await.unwrap_err(), DiscoveryError::NoSources);
    }
}
