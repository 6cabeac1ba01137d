//! Execution state of one plan run

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plan::snapshot::{self, EXECUTION_SCHEMA, SnapshotError};
use crate::plan::{CallId, Plan, PlanId, ResultLookup};
use crate::resilience::ErrorCategory;
use crate::tool::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Skipped,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Running => "running",
            CallStatus::Succeeded => "succeeded",
            CallStatus::Failed => "failed",
            CallStatus::TimedOut => "timed-out",
            CallStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallStatus::Pending | CallStatus::Running)
    }

    /// Failed or timed out
    pub fn is_failure(&self) -> bool {
        matches!(self, CallStatus::Failed | CallStatus::TimedOut)
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    PartiallyCompleted,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Running => "running",
            PlanStatus::Completed => "completed",
            PlanStatus::Failed => "failed",
            PlanStatus::PartiallyCompleted => "partially-completed",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An alternative tool served the call after the planned tool gave up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub original_tool: String,
    pub substitute_tool: String,
    /// Capability tags the two tools share
    pub shared_capabilities: Vec<String>,
}

/// Structured explanation of a call nothing could serve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsatisfiedRecord {
    /// Capabilities of the failed tool that remain unserved
    pub capabilities: Vec<String>,
    /// Every tool that was tried, planned tool first
    pub considered: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: CallId,
    /// Tool named by the plan
    pub tool_name: String,
    pub status: CallStatus,
    /// Dispatch attempts across the planned tool and any fallbacks
    #[serde(default)]
    pub attempts: u32,
    /// Retries of the planned tool
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsatisfied: Option<UnsatisfiedRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

impl CallRecord {
    pub fn pending(id: CallId, tool_name: impl Into<String>) -> Self {
        Self {
            id,
            tool_name: tool_name.into(),
            status: CallStatus::Pending,
            attempts: 0,
            retries: 0,
            payload: None,
            error: None,
            error_category: None,
            fallback: None,
            unsatisfied: None,
            skip_reason: None,
            latency_ms: 0,
        }
    }

    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.status = CallStatus::Skipped;
        self.skip_reason = Some(reason.into());
        self
    }

    /// Tool that produced the final outcome
    pub fn served_by(&self) -> &str {
        self.fallback
            .as_ref()
            .map(|f| f.substitute_tool.as_str())
            .unwrap_or(&self.tool_name)
    }
}

/// Per-call records of one plan run, in the plan's declared order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub plan_id: PlanId,
    pub status: PlanStatus,
    pub calls: Vec<CallRecord>,
}

impl ExecutionState {
    pub fn new(plan: &Plan) -> Self {
        Self {
            plan_id: plan.id.clone(),
            status: PlanStatus::Pending,
            calls: plan
                .calls
                .iter()
                .map(|c| CallRecord::pending(c.id.clone(), &c.tool_name))
                .collect(),
        }
    }

    /// Fresh state for `plan` that keeps the succeeded calls of `previous`
    ///
    /// A previous record is reused only when it belongs to the same plan and
    /// names the same tool as the current call.
    pub fn resume(plan: &Plan, previous: &ExecutionState) -> Self {
        let mut state = Self::new(plan);
        if previous.plan_id != plan.id {
            return state;
        }
        for record in &mut state.calls {
            if let Some(done) = previous.record(record.id.as_str())
                && done.status == CallStatus::Succeeded
                && done.tool_name == record.tool_name
            {
                *record = done.clone();
            }
        }
        state
    }

    pub fn record(&self, id: &str) -> Option<&CallRecord> {
        self.calls.iter().find(|r| r.id.as_str() == id)
    }

    pub fn record_mut(&mut self, id: &str) -> Option<&mut CallRecord> {
        self.calls.iter_mut().find(|r| r.id.as_str() == id)
    }

    pub fn status_of(&self, id: &str) -> Option<CallStatus> {
        self.record(id).map(|r| r.status)
    }

    /// Payloads of succeeded calls, for substitution
    pub fn results(&self) -> ResultLookup {
        self.calls
            .iter()
            .filter(|r| r.status == CallStatus::Succeeded)
            .map(|r| (r.id.clone(), r.payload.clone().unwrap_or(Value::Null)))
            .collect()
    }

    pub fn count(&self, status: CallStatus) -> usize {
        self.calls.iter().filter(|r| r.status == status).count()
    }

    /// Derive the overall status from the per-call records
    pub fn settle(&mut self) -> PlanStatus {
        let succeeded = self.count(CallStatus::Succeeded);
        self.status = if succeeded == self.calls.len() {
            PlanStatus::Completed
        } else if succeeded == 0 {
            PlanStatus::Failed
        } else {
            PlanStatus::PartiallyCompleted
        };
        self.status
    }

    pub fn export(&self) -> Result<String, SnapshotError> {
        snapshot::export_document(EXECUTION_SCHEMA, "state", self)
    }

    pub fn import(text: &str) -> Result<Self, SnapshotError> {
        snapshot::import_document(EXECUTION_SCHEMA, "state", text)
    }
}
