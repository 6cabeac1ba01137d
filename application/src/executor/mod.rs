//! Plan executor
//!
//! Walks a plan level by level:
//!
//! ```text
//! for each dependency level
//!   ├─ cancelled?            → remaining calls Skipped ("cancelled")
//!   ├─ dependency failed?    → call Skipped (reason names the dependency)
//!   └─ ready calls, at most max_in_flight at once:
//!        substitute ─▶ attempt loop (timeout, retry, backoff)
//!                         └─ gave up ─▶ fallback candidates ─▶ unsatisfied
//! ```
//!
//! Every call ends in exactly one terminal status. A failure never aborts
//! siblings in the same level; only dependents are skipped.

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use toolweave_domain::{
    CallId, CallRecord, CallStatus, ErrorCategory, ExecutionEvent, ExecutionReport,
    ExecutionState, FallbackRecord, Plan, PlanId, PlanStatus, PlanValidationError, ResultLookup,
    ToolCall, ToolError, substitute,
};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::ExecutionParams;
use crate::ports::event_sink::EventSink;
use crate::resilience::{BreakerRegistry, fallback_candidates, unsatisfied};
use crate::router::{DispatchError, HybridRouter};

/// Why the last attempt against a tool failed
#[derive(Debug, Clone)]
struct AttemptFailure {
    error: ToolError,
    category: ErrorCategory,
    timed_out: bool,
    /// Data returned alongside an application-level failure
    payload: Option<Value>,
    /// No tool was contacted (not found, circuit open); never retried
    short_circuited: bool,
}

impl AttemptFailure {
    fn from_dispatch(error: &DispatchError) -> Self {
        Self {
            error: error.to_tool_error(),
            category: error.category(),
            timed_out: false,
            payload: None,
            short_circuited: true,
        }
    }
}

/// Outcome of running one tool with its retry budget
struct ToolRun {
    attempts: u32,
    retries: u32,
    outcome: Result<Value, AttemptFailure>,
}

/// Identity of the call being run, for events and logs
struct CallContext<'a> {
    plan_id: &'a PlanId,
    call: &'a ToolCall,
    cancel: &'a CancellationToken,
}

pub struct Executor {
    router: Arc<HybridRouter>,
    catalog: Arc<Catalog>,
    events: Arc<dyn EventSink>,
    params: ExecutionParams,
}

impl Executor {
    pub fn new(
        router: Arc<HybridRouter>,
        catalog: Arc<Catalog>,
        events: Arc<dyn EventSink>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            router,
            catalog,
            events,
            params,
        }
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    fn breakers(&self) -> &BreakerRegistry {
        self.router.breakers()
    }

    /// Execute a plan from scratch
    ///
    /// Fails only when the plan itself is invalid; every call-level failure
    /// is reported in the returned [`ExecutionReport`].
    pub async fn execute(
        &self,
        plan: &Plan,
        cancel: CancellationToken,
    ) -> Result<ExecutionReport, PlanValidationError> {
        self.run(plan, ExecutionState::new(plan), cancel).await
    }

    /// Execute a plan, keeping calls that already succeeded in `previous`
    pub async fn resume(
        &self,
        plan: &Plan,
        previous: &ExecutionState,
        cancel: CancellationToken,
    ) -> Result<ExecutionReport, PlanValidationError> {
        let state = ExecutionState::resume(plan, previous);
        let kept = state.count(CallStatus::Succeeded);
        if kept > 0 {
            info!(plan_id = %plan.id, kept, "Resuming plan");
        }
        self.run(plan, state, cancel).await
    }

    async fn run(
        &self,
        plan: &Plan,
        mut state: ExecutionState,
        cancel: CancellationToken,
    ) -> Result<ExecutionReport, PlanValidationError> {
        let levels = plan.levels()?;
        let started = Instant::now();

        state.status = PlanStatus::Running;
        info!(plan_id = %plan.id, calls = plan.len(), levels = levels.len(), "Executing plan");
        self.events.record(&ExecutionEvent::PlanStarted {
            plan_id: plan.id.clone(),
            call_count: plan.len(),
        });

        for (depth, level) in levels.iter().enumerate() {
            let mut ready: Vec<&ToolCall> = Vec::new();

            for &index in level {
                let call = &plan.calls[index];
                if state.status_of(call.id.as_str()) == Some(CallStatus::Succeeded) {
                    debug!(call = %call.id, "Already succeeded, not dispatching");
                    continue;
                }

                let reason = if cancel.is_cancelled() {
                    Some("cancelled".to_string())
                } else {
                    blocking_dependency(call, &state)
                };
                match reason {
                    Some(reason) => {
                        debug!(call = %call.id, %reason, "Skipping call");
                        let record =
                            CallRecord::pending(call.id.clone(), &call.tool_name).skipped(reason);
                        self.finish(&plan.id, &record);
                        store(&mut state, record);
                    }
                    None => ready.push(call),
                }
            }

            if ready.is_empty() {
                continue;
            }
            debug!(plan_id = %plan.id, level = depth, calls = ready.len(), "Dispatching level");
            for call in &ready {
                if let Some(record) = state.record_mut(call.id.as_str()) {
                    record.status = CallStatus::Running;
                }
            }

            let results = state.results();
            let records: Vec<CallRecord> = stream::iter(ready)
                .map(|call| {
                    let ctx = CallContext {
                        plan_id: &plan.id,
                        call,
                        cancel: &cancel,
                    };
                    let results = &results;
                    async move { self.run_call(ctx, results).await }
                })
                .buffer_unordered(self.params.max_in_flight.max(1))
                .collect()
                .await;

            for record in records {
                store(&mut state, record);
            }
        }

        let cancelled = cancel.is_cancelled();
        let status = state.settle();
        let duration_ms = started.elapsed().as_millis() as u64;
        let report = ExecutionReport::from_state(&state, duration_ms, cancelled);

        info!(
            plan_id = %plan.id,
            status = %status,
            duration_ms,
            failed = report.failed_calls.len(),
            skipped = report.skipped_calls.len(),
            cancelled,
            "Plan finished"
        );
        self.events.record(&ExecutionEvent::PlanFinished {
            plan_id: plan.id.clone(),
            status,
            duration_ms,
            failed: report.failed_calls.len(),
            skipped: report.skipped_calls.len(),
            cancelled,
        });
        Ok(report)
    }

    async fn run_call(&self, ctx: CallContext<'_>, results: &ResultLookup) -> CallRecord {
        let call = ctx.call;
        let started = Instant::now();
        let mut record = CallRecord::pending(call.id.clone(), &call.tool_name);

        let params = match substitute(call, results) {
            Ok(params) => params,
            Err(e) => {
                warn!(call = %call.id, error = %e, "Substitution failed");
                let error = DispatchError::from(e).to_tool_error();
                record.status = CallStatus::Failed;
                record.error_category = Some(ErrorCategory::InvalidParameters);
                record.error = Some(error);
                self.finish(ctx.plan_id, &record);
                return record;
            }
        };

        let max_retries = call.max_retries.unwrap_or(self.params.max_retries);
        let run = self.run_tool(&ctx, &call.tool_name, &params, max_retries).await;
        record.attempts = run.attempts;
        record.retries = run.retries;

        let failure = match run.outcome {
            Ok(payload) => {
                record.status = CallStatus::Succeeded;
                record.payload = Some(payload);
                record.latency_ms = millis(started.elapsed());
                self.finish(ctx.plan_id, &record);
                return record;
            }
            Err(failure) => failure,
        };

        let original = self.catalog.lookup(&call.tool_name);
        let mut considered = vec![call.tool_name.clone()];
        let mut searched = false;

        if failure.category != ErrorCategory::InvalidParameters
            && !ctx.cancel.is_cancelled()
            && let Some(original) = &original
        {
            searched = true;
            let snapshot = self.catalog.snapshot();
            let candidates = fallback_candidates(
                &snapshot,
                original,
                &considered,
                self.breakers(),
                self.params.max_fallbacks,
            );

            for candidate in candidates {
                if ctx.cancel.is_cancelled() {
                    break;
                }
                warn!(
                    call = %call.id,
                    from = %call.tool_name,
                    to = %candidate.name,
                    "Falling back to alternative tool"
                );
                self.events.record(&ExecutionEvent::FallbackSelected {
                    plan_id: ctx.plan_id.clone(),
                    call_id: call.id.clone(),
                    from_tool: call.tool_name.clone(),
                    to_tool: candidate.name.clone(),
                });
                considered.push(candidate.name.clone());

                let run = self
                    .run_tool(&ctx, &candidate.name, &params, max_retries)
                    .await;
                record.attempts += run.attempts;
                if let Ok(payload) = run.outcome {
                    record.status = CallStatus::Succeeded;
                    record.payload = Some(payload);
                    record.fallback = Some(FallbackRecord {
                        original_tool: call.tool_name.clone(),
                        substitute_tool: candidate.name.clone(),
                        shared_capabilities: candidate
                            .shared_capabilities(original)
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                    });
                    // The planned tool's failure stays visible next to the rescue
                    record.error = Some(failure.error);
                    record.error_category = Some(failure.category);
                    record.latency_ms = millis(started.elapsed());
                    self.finish(ctx.plan_id, &record);
                    return record;
                }
            }
        }

        record.status = if failure.timed_out {
            CallStatus::TimedOut
        } else {
            CallStatus::Failed
        };
        record.error_category = Some(failure.category);
        record.error = Some(failure.error);
        record.payload = failure.payload;
        if searched || original.is_none() {
            let unsatisfied = unsatisfied(&call.tool_name, original.as_ref(), considered);
            warn!(call = %call.id, explanation = %unsatisfied.explanation, "Call unsatisfied");
            record.unsatisfied = Some(unsatisfied);
        }
        record.latency_ms = millis(started.elapsed());
        self.finish(ctx.plan_id, &record);
        record
    }

    /// Run one tool with the retry budget
    async fn run_tool(
        &self,
        ctx: &CallContext<'_>,
        tool: &str,
        params: &Map<String, Value>,
        max_retries: u32,
    ) -> ToolRun {
        let timeout = ctx.call.timeout().unwrap_or(self.params.call_timeout);
        let started = Instant::now();
        let mut attempts = 0;
        let mut retries = 0;
        let mut contacted = false;

        let outcome = loop {
            attempts += 1;
            let snapshot = self.catalog.snapshot();
            let dispatch = self.router.dispatch_to(tool, &snapshot, params);

            let failure = match tokio::time::timeout(timeout, dispatch).await {
                Ok(Ok(result)) => {
                    contacted = true;
                    if result.is_success() {
                        break Ok(result.payload.unwrap_or(Value::Null));
                    }
                    let error = result.error.unwrap_or_else(|| {
                        ToolError::execution_failed("tool reported failure without an error")
                    });
                    AttemptFailure {
                        category: ErrorCategory::classify(&error),
                        error,
                        timed_out: false,
                        payload: result.payload,
                        short_circuited: false,
                    }
                }
                Ok(Err(dispatch_error)) => AttemptFailure::from_dispatch(&dispatch_error),
                Err(_) => {
                    contacted = true;
                    // The dropped dispatch never reported back to the breaker
                    self.breakers()
                        .record_failure(tool, ErrorCategory::TransientIo);
                    AttemptFailure {
                        error: ToolError::timeout(format!("{} after {}ms", tool, millis(timeout))),
                        category: ErrorCategory::TransientIo,
                        timed_out: true,
                        payload: None,
                        short_circuited: false,
                    }
                }
            };

            let retry = !failure.short_circuited
                && failure.category.is_retryable()
                && retries < max_retries
                && !ctx.cancel.is_cancelled();
            if !retry {
                debug!(
                    call = %ctx.call.id,
                    tool,
                    attempts,
                    category = %failure.category,
                    "Giving up on tool"
                );
                break Err(failure);
            }

            retries += 1;
            let delay = self.params.backoff.delay_for(retries);
            warn!(
                call = %ctx.call.id,
                tool,
                attempt = attempts + 1,
                delay_ms = millis(delay),
                category = %failure.category,
                error = %failure.error,
                "Retrying tool call"
            );
            self.events.record(&ExecutionEvent::CallRetried {
                plan_id: ctx.plan_id.clone(),
                call_id: ctx.call.id.clone(),
                tool: tool.to_string(),
                attempt: attempts + 1,
                delay_ms: millis(delay),
                category: failure.category,
            });

            tokio::select! {
                _ = ctx.cancel.cancelled() => break Err(failure),
                _ = tokio::time::sleep(delay) => {}
            }
        };

        if contacted {
            self.catalog
                .record_outcome(tool, outcome.is_ok(), started.elapsed());
        }
        ToolRun {
            attempts,
            retries,
            outcome,
        }
    }

    fn finish(&self, plan_id: &PlanId, record: &CallRecord) {
        debug!(
            call = %record.id,
            tool = record.served_by(),
            status = %record.status,
            attempts = record.attempts,
            latency_ms = record.latency_ms,
            "Call finished"
        );
        self.events.record(&ExecutionEvent::CallFinished {
            plan_id: plan_id.clone(),
            call_id: record.id.clone(),
            tool: record.served_by().to_string(),
            status: record.status,
            latency_ms: record.latency_ms,
            attempts: record.attempts,
        });
    }
}

/// Reason a call cannot run because of one of its dependencies
fn blocking_dependency(call: &ToolCall, state: &ExecutionState) -> Option<String> {
    call.depends_on.iter().find_map(|dep| match state.status_of(dep.as_str()) {
        Some(status) if status.is_failure() => Some(format!("dependency '{}' failed", dep)),
        Some(CallStatus::Skipped) => Some(format!("dependency '{}' was skipped", dep)),
        _ => None,
    })
}

fn store(state: &mut ExecutionState, record: CallRecord) {
    let id: CallId = record.id.clone();
    if let Some(slot) = state.record_mut(id.as_str()) {
        *slot = record;
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
