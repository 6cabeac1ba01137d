//! Structured execution telemetry
//!
//! Events are plain data handed to an observability sink. They are not
//! diagnostic logs: every field is stable and machine-readable.

use serde::{Deserialize, Serialize};

use super::state::{CallStatus, PlanStatus};
use crate::plan::{CallId, PlanId};
use crate::resilience::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    CatalogRefreshed {
        tool_count: usize,
        sources_ok: Vec<String>,
        sources_failed: Vec<String>,
        conflicts: usize,
    },
    PlanStarted {
        plan_id: PlanId,
        call_count: usize,
    },
    CallRetried {
        plan_id: PlanId,
        call_id: CallId,
        tool: String,
        /// Attempt about to start (2 = first retry)
        attempt: u32,
        delay_ms: u64,
        category: ErrorCategory,
    },
    CircuitOpened {
        tool: String,
        consecutive_failures: u32,
    },
    FallbackSelected {
        plan_id: PlanId,
        call_id: CallId,
        from_tool: String,
        to_tool: String,
    },
    CallFinished {
        plan_id: PlanId,
        call_id: CallId,
        /// Tool that produced the outcome (a fallback when one was used)
        tool: String,
        status: CallStatus,
        latency_ms: u64,
        attempts: u32,
    },
    PlanFinished {
        plan_id: PlanId,
        status: PlanStatus,
        duration_ms: u64,
        failed: usize,
        skipped: usize,
        cancelled: bool,
    },
}

impl ExecutionEvent {
    /// Event type name as it appears in the serialized `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionEvent::CatalogRefreshed { .. } => "catalog_refreshed",
            ExecutionEvent::PlanStarted { .. } => "plan_started",
            ExecutionEvent::CallRetried { .. } => "call_retried",
            ExecutionEvent::CircuitOpened { .. } => "circuit_opened",
            ExecutionEvent::FallbackSelected { .. } => "fallback_selected",
            ExecutionEvent::CallFinished { .. } => "call_finished",
            ExecutionEvent::PlanFinished { .. } => "plan_finished",
        }
    }

    pub fn plan_id(&self) -> Option<&PlanId> {
        match self {
            ExecutionEvent::PlanStarted { plan_id, .. }
            | ExecutionEvent::CallRetried { plan_id, .. }
            | ExecutionEvent::FallbackSelected { plan_id, .. }
            | ExecutionEvent::CallFinished { plan_id, .. }
            | ExecutionEvent::PlanFinished { plan_id, .. } => Some(plan_id),
            ExecutionEvent::CatalogRefreshed { .. } | ExecutionEvent::CircuitOpened { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_matches_kind() {
        let event = ExecutionEvent::CallFinished {
            plan_id: PlanId::new("p"),
            call_id: CallId::new("search"),
            tool: "search".into(),
            status: CallStatus::TimedOut,
            latency_ms: 40,
            attempts: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert_eq!(json["status"], "timed-out");
        assert_eq!(json["plan_id"], "p");
        assert_eq!(event.plan_id().map(PlanId::as_str), Some("p"));
    }

    #[test]
    fn test_catalog_events_have_no_plan() {
        let event = ExecutionEvent::CircuitOpened {
            tool: "notify".into(),
            consecutive_failures: 5,
        };
        assert!(event.plan_id().is_none());
        assert_eq!(
            serde_json::to_value(&event).unwrap()["type"],
            "circuit_opened"
        );
    }
}
