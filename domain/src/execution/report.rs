//! Final execution report
//!
//! The report never collapses a run into a single opaque failure: it lists
//! which calls succeeded, which were retried and how often, which were served
//! by a fallback tool, which were skipped and why, and which remain
//! unsatisfied together with the capability nothing could serve.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::state::{CallRecord, CallStatus, ExecutionState, PlanStatus};
use crate::plan::{CallId, PlanId};
use crate::util::preview;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetriedCall {
    pub id: CallId,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub plan_id: PlanId,
    pub plan_status: PlanStatus,
    /// Per-call results in declared order
    pub calls: Vec<CallRecord>,
    pub total_duration_ms: u64,
    /// Calls that ended failed or timed out
    pub failed_calls: Vec<CallId>,
    pub skipped_calls: Vec<CallId>,
    pub retried_calls: Vec<RetriedCall>,
    pub fallback_calls: Vec<CallId>,
    pub unsatisfied_calls: Vec<CallId>,
    pub cancelled: bool,
}

impl ExecutionReport {
    pub fn from_state(state: &ExecutionState, total_duration_ms: u64, cancelled: bool) -> Self {
        let ids = |pred: &dyn Fn(&CallRecord) -> bool| -> Vec<CallId> {
            state
                .calls
                .iter()
                .filter(|r| pred(r))
                .map(|r| r.id.clone())
                .collect()
        };

        Self {
            plan_id: state.plan_id.clone(),
            plan_status: state.status,
            calls: state.calls.clone(),
            total_duration_ms,
            failed_calls: ids(&|r| r.status.is_failure()),
            skipped_calls: ids(&|r| r.status == CallStatus::Skipped),
            retried_calls: state
                .calls
                .iter()
                .filter(|r| r.retries > 0)
                .map(|r| RetriedCall {
                    id: r.id.clone(),
                    retries: r.retries,
                })
                .collect(),
            fallback_calls: ids(&|r| r.fallback.is_some()),
            unsatisfied_calls: ids(&|r| r.unsatisfied.is_some()),
            cancelled,
        }
    }

    /// Execution state carried by this report, for later resumption
    pub fn state(&self) -> ExecutionState {
        ExecutionState {
            plan_id: self.plan_id.clone(),
            status: self.plan_status,
            calls: self.calls.clone(),
        }
    }

    pub fn call(&self, id: &str) -> Option<&CallRecord> {
        self.calls.iter().find(|r| r.id.as_str() == id)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &CallRecord> {
        self.calls
            .iter()
            .filter(|r| r.status == CallStatus::Succeeded)
    }

    /// Human-readable multi-line summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Plan {} {} in {}ms{}",
            self.plan_id,
            self.plan_status,
            self.total_duration_ms,
            if self.cancelled { " (cancelled)" } else { "" }
        );

        for record in &self.calls {
            let _ = write!(out, "  {} [{}] {}", record.id, record.served_by(), record.status);
            if record.retries > 0 {
                let _ = write!(out, ", retried {}x", record.retries);
            }
            if let Some(fallback) = &record.fallback {
                let _ = write!(
                    out,
                    ", fell back from {} to {}",
                    fallback.original_tool, fallback.substitute_tool
                );
            }
            match record.status {
                CallStatus::Succeeded => {
                    if let Some(payload) = &record.payload {
                        let _ = write!(out, ": {}", preview(payload, 60));
                    }
                }
                CallStatus::Skipped => {
                    if let Some(reason) = &record.skip_reason {
                        let _ = write!(out, ": {}", reason);
                    }
                }
                _ => {
                    if let Some(error) = &record.error {
                        let _ = write!(out, ": {}", error);
                    }
                }
            }
            out.push('\n');

            if let Some(unsatisfied) = &record.unsatisfied {
                let _ = writeln!(out, "    unsatisfied: {}", unsatisfied.explanation);
            }
        }

        out
    }
}
