//! Tool catalog
//!
//! The [`Catalog`] owns every [`ToolDescriptor`] the engine knows about. Its
//! content lives in an immutable [`CatalogSnapshot`] that is replaced as a
//! whole on refresh, so a reader holding a snapshot never observes a
//! half-updated catalog.
//!
//! # Performance records
//!
//! Identity is immutable, performance is not. Each snapshot entry carries its
//! own lock around the tool's [`PerformanceRecord`]; concurrent plans that
//! report outcomes for the same tool serialize on that lock only. A tool that
//! keeps its name and owning source across a refresh keeps the same shared
//! record, so outcomes reported through an older snapshot are never lost.
//!
//! # Name conflicts
//!
//! Names are unique within a source. When two sources announce the same
//! name, the first-registered source wins and a [`NameConflict`] is kept.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use toolweave_domain::{
    CapabilityVocabulary, Categorizer, PerformanceRecord, SourceKind, ToolCategory,
    ToolDefinition, ToolDescriptor,
};
use tracing::{debug, trace, warn};

/// A cross-source name collision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameConflict {
    pub tool: String,
    pub kept_source: String,
    pub dropped_source: String,
}

/// Tools announced by one source during a refresh
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: String,
    pub kind: SourceKind,
    pub tools: Vec<ToolDefinition>,
}

/// Counts over a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_tools: usize,
    pub internal_tools: usize,
    pub proxy_tools: usize,
    pub tools_per_source: BTreeMap<String, usize>,
    pub tools_per_category: BTreeMap<ToolCategory, usize>,
}

#[derive(Debug)]
struct CatalogEntry {
    descriptor: ToolDescriptor,
    performance: Arc<Mutex<PerformanceRecord>>,
}

impl CatalogEntry {
    fn current(&self) -> ToolDescriptor {
        let mut descriptor = self.descriptor.clone();
        descriptor.performance = *self
            .performance
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        descriptor
    }
}

/// Immutable view of the catalog at one point in time
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    tools: BTreeMap<String, CatalogEntry>,
    conflicts: Vec<NameConflict>,
}

impl CatalogSnapshot {
    /// Build a snapshot from per-source batches in registration order
    ///
    /// Tools that keep their name and owning source share their performance
    /// record with `previous`.
    pub fn build(
        batches: Vec<SourceBatch>,
        categorizer: &Categorizer,
        vocabulary: &CapabilityVocabulary,
        previous: Option<&CatalogSnapshot>,
    ) -> Self {
        let mut tools: BTreeMap<String, CatalogEntry> = BTreeMap::new();
        let mut conflicts = Vec::new();

        for batch in batches {
            for definition in batch.tools {
                if let Some(existing) = tools.get(&definition.name) {
                    if existing.descriptor.source == batch.source {
                        warn!(
                            tool = %definition.name,
                            source = %batch.source,
                            "Source announced the same tool twice, keeping the first"
                        );
                    } else {
                        trace!(
                            tool = %definition.name,
                            kept = %existing.descriptor.source,
                            dropped = %batch.source,
                            "Tool already registered by an earlier source"
                        );
                        conflicts.push(NameConflict {
                            tool: definition.name.clone(),
                            kept_source: existing.descriptor.source.clone(),
                            dropped_source: batch.source.clone(),
                        });
                    }
                    continue;
                }

                let category = categorizer.categorize(&definition.name, &definition.description);
                let capabilities = if definition.capabilities.is_empty() {
                    vocabulary
                        .extract(&format!("{} {}", definition.name, definition.description))
                        .into_iter()
                        .collect()
                } else {
                    vocabulary.normalize_tags(&definition.capabilities)
                };

                let descriptor = ToolDescriptor::from_definition(
                    definition,
                    batch.source.clone(),
                    batch.kind,
                    category,
                    capabilities,
                );
                let performance = previous
                    .and_then(|p| p.tools.get(&descriptor.name))
                    .filter(|e| e.descriptor.source == descriptor.source)
                    .map(|e| Arc::clone(&e.performance))
                    .unwrap_or_default();

                debug!(
                    tool = %descriptor.name,
                    source = %descriptor.source,
                    category = %descriptor.category,
                    "Registered tool"
                );
                tools.insert(
                    descriptor.name.clone(),
                    CatalogEntry {
                        descriptor,
                        performance,
                    },
                );
            }
        }

        Self { tools, conflicts }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptor with its current performance record
    pub fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.get(name).map(CatalogEntry::current)
    }

    /// All descriptors, ordered by name
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(CatalogEntry::current).collect()
    }

    /// Descriptors matching both filters (an absent filter matches everything)
    pub fn query(
        &self,
        category: Option<ToolCategory>,
        capability: Option<&str>,
    ) -> Vec<ToolDescriptor> {
        let capability = capability.map(str::to_lowercase);
        self.tools
            .values()
            .filter(|e| category.is_none_or(|c| e.descriptor.category == c))
            .filter(|e| {
                capability
                    .as_deref()
                    .is_none_or(|t| e.descriptor.has_capability(t))
            })
            .map(CatalogEntry::current)
            .collect()
    }

    pub fn conflicts(&self) -> &[NameConflict] {
        &self.conflicts
    }

    /// Fold one call outcome into the tool's rolling record
    ///
    /// Returns `false` when the tool is not in this snapshot.
    pub fn record_outcome(&self, name: &str, success: bool, latency: Duration) -> bool {
        match self.tools.get(name) {
            Some(entry) => {
                entry
                    .performance
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(success, latency);
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            total_tools: self.tools.len(),
            ..CatalogStats::default()
        };
        for entry in self.tools.values() {
            let d = &entry.descriptor;
            if d.is_proxy() {
                stats.proxy_tools += 1;
            } else {
                stats.internal_tools += 1;
            }
            *stats.tools_per_source.entry(d.source.clone()).or_insert(0) += 1;
            *stats.tools_per_category.entry(d.category).or_insert(0) += 1;
        }
        stats
    }
}

/// Shared catalog handle: an atomically swapped snapshot
pub struct Catalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    categorizer: Categorizer,
    vocabulary: CapabilityVocabulary,
}

impl Catalog {
    pub fn new(categorizer: Categorizer, vocabulary: CapabilityVocabulary) -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::default())),
            categorizer,
            vocabulary,
        }
    }

    pub fn vocabulary(&self) -> &CapabilityVocabulary {
        &self.vocabulary
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build a snapshot from `batches` and swap it in
    ///
    /// The write lock is held while building so concurrent refreshes each
    /// start from the snapshot the other produced.
    pub fn replace(&self, batches: Vec<SourceBatch>) -> Arc<CatalogSnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(CatalogSnapshot::build(
            batches,
            &self.categorizer,
            &self.vocabulary,
            Some(&**current),
        ));
        *current = next.clone();
        next
    }

    pub fn lookup(&self, name: &str) -> Option<ToolDescriptor> {
        self.snapshot().lookup(name)
    }

    pub fn query(
        &self,
        category: Option<ToolCategory>,
        capability: Option<&str>,
    ) -> Vec<ToolDescriptor> {
        self.snapshot().query(category, capability)
    }

    pub fn record_outcome(&self, name: &str, success: bool, latency: Duration) -> bool {
        self.snapshot().record_outcome(name, success, latency)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Categorizer::default(), CapabilityVocabulary::default())
    }
}
