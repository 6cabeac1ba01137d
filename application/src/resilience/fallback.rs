//! Fallback selection
//!
//! When the planned tool gives up, a substitute must share at least one
//! capability with it. Candidates with an open breaker are skipped, as are
//! tools already tried for the same call. Order follows recorded
//! performance (success rate, then latency, then name).

use toolweave_domain::tool::performance_order;
use toolweave_domain::{ToolDescriptor, UnsatisfiedRecord};

use super::breakers::BreakerRegistry;
use crate::catalog::CatalogSnapshot;

/// Substitutes for `original`, best first, at most `limit`
pub fn fallback_candidates(
    snapshot: &CatalogSnapshot,
    original: &ToolDescriptor,
    considered: &[String],
    breakers: &BreakerRegistry,
    limit: usize,
) -> Vec<ToolDescriptor> {
    let mut candidates: Vec<ToolDescriptor> = snapshot
        .descriptors()
        .into_iter()
        .filter(|d| d.name != original.name)
        .filter(|d| !considered.iter().any(|c| c == &d.name))
        .filter(|d| !d.shared_capabilities(original).is_empty())
        .filter(|d| !breakers.is_open(&d.name))
        .collect();
    candidates.sort_by(performance_order);
    candidates.truncate(limit);
    candidates
}

/// Explain why nothing could serve a call
pub fn unsatisfied(
    tool_name: &str,
    original: Option<&ToolDescriptor>,
    considered: Vec<String>,
) -> UnsatisfiedRecord {
    let Some(original) = original else {
        return UnsatisfiedRecord {
            capabilities: Vec::new(),
            explanation: format!("tool '{}' is not in the catalog", tool_name),
            considered,
        };
    };

    let capabilities: Vec<String> = original.capabilities.iter().cloned().collect();
    let tried = considered.join(", ");
    let explanation = match capabilities.as_slice() {
        [] => format!(
            "tool '{}' declares no capabilities, so no substitute could be chosen (considered: {})",
            tool_name, tried
        ),
        [single] => format!(
            "no available tool offers capability '{}' (considered: {})",
            single, tried
        ),
        many => format!(
            "no available tool offers capabilities {} (considered: {})",
            many.iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join(", "),
            tried
        ),
    };

    UnsatisfiedRecord {
        capabilities,
        considered,
        explanation,
    }
}
