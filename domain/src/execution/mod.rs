//! Execution domain: per-call state, final report, telemetry events

pub mod events;
pub mod report;
pub mod state;

pub use events::ExecutionEvent;
pub use report::{ExecutionReport, RetriedCall};
pub use state::{
    CallRecord, CallStatus, ExecutionState, FallbackRecord, PlanStatus, UnsatisfiedRecord,
};
