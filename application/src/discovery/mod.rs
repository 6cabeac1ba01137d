//! Tool discovery
//!
//! Sources are registered once; [`DiscoveryEngine::refresh`] asks each of
//! them for its tools and rebuilds the [`Catalog`](crate::catalog::Catalog).

pub mod engine;
pub mod source;

pub use engine::{DiscoveryEngine, DiscoveryError, RefreshOutcome, SourceFailure};
pub use source::{DiscoverySource, SourceRegistry};
