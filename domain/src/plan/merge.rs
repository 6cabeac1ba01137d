//! Plan composition
//!
//! Merging concatenates the input plans' calls in order, resolves duplicate
//! call IDs according to [`MergeMode`], renumbers the union into a stable
//! topological order and re-validates it. Individual inputs need not be valid
//! on their own: a sub-plan may depend on a call supplied by another.

use serde::{Deserialize, Serialize};

use super::entities::{Plan, PlanId, ToolCall};
use super::validation::{self, PlanValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Any repeated call ID is an error
    #[default]
    Strict,
    /// Identical repeats collapse into the first occurrence
    Idempotent,
}

pub fn merge_plans(plans: &[Plan], mode: MergeMode) -> Result<Plan, PlanValidationError> {
    let mut calls: Vec<ToolCall> = Vec::new();

    for call in plans.iter().flat_map(|p| p.calls.iter()) {
        match calls.iter().find(|c| c.id == call.id) {
            None => calls.push(call.clone()),
            Some(_) if mode == MergeMode::Strict => {
                return Err(PlanValidationError::DuplicateCallId(call.id.clone()));
            }
            Some(existing) if existing == call => {}
            Some(_) => {
                return Err(PlanValidationError::ConflictingDuplicate {
                    id: call.id.clone(),
                });
            }
        }
    }

    validation::check_graph(&calls)?;
    let order = validation::stable_order(&calls);
    let mut slots: Vec<Option<ToolCall>> = calls.into_iter().map(Some).collect();
    let calls: Vec<ToolCall> = order.into_iter().filter_map(|i| slots[i].take()).collect();

    let merged = Plan {
        id: merged_id(plans),
        intent: plans
            .iter()
            .map(|p| p.intent.as_str())
            .filter(|i| !i.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        calls,
    };
    merged.validate()?;
    Ok(merged)
}

fn merged_id(plans: &[Plan]) -> PlanId {
    match plans {
        [single] => single.id.clone(),
        _ => PlanId::new(
            plans
                .iter()
                .map(|p| p.id.as_str())
                .collect::<Vec<_>>()
                .join("+"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::entities::CallId;

    fn ids(plan: &Plan) -> Vec<&str> {
        plan.calls.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_merge_unions_and_orders() {
        // The second sub-plan feeds the first
        let consumer = Plan::new("p1", "store")
            .with_call(ToolCall::new("store", "store").depends_on("search"));
        let producer = Plan::new("p2", "search").with_call(ToolCall::new("search", "search"));

        let merged = merge_plans(&[consumer, producer], MergeMode::Strict).unwrap();
        assert_eq!(ids(&merged), vec!["search", "store"]);
        assert_eq!(merged.id.as_str(), "p1+p2");
        assert_eq!(merged.intent, "store; search");
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_strict_rejects_duplicates() {
        let a = Plan::new("a", "").with_call(ToolCall::new("x", "search"));
        let b = Plan::new("b", "").with_call(ToolCall::new("x", "search"));
        assert_eq!(
            merge_plans(&[a, b], MergeMode::Strict),
            Err(PlanValidationError::DuplicateCallId(CallId::new("x")))
        );
    }

    #[test]
    fn test_idempotent_collapses_identical() {
        let shared = ToolCall::new("x", "search").with_param("input", "rust");
        let a = Plan::new("a", "")
            .with_call(shared.clone())
            .with_call(ToolCall::new("y", "store").depends_on("x"));
        let b = Plan::new("b", "")
            .with_call(shared)
            .with_call(ToolCall::new("z", "notify").depends_on("x"));

        let merged = merge_plans(&[a, b], MergeMode::Idempotent).unwrap();
        assert_eq!(ids(&merged), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_idempotent_rejects_conflicting() {
        let a = Plan::new("a", "").with_call(ToolCall::new("x", "search"));
        let b = Plan::new("b", "").with_call(ToolCall::new("x", "fetch"));
        assert_eq!(
            merge_plans(&[a, b], MergeMode::Idempotent),
            Err(PlanValidationError::ConflictingDuplicate { id: CallId::new("x") })
        );
    }

    #[test]
    fn test_merge_detects_cross_plan_cycle() {
        let a = Plan::new("a", "").with_call(ToolCall::new("x", "search").depends_on("y"));
        let b = Plan::new("b", "").with_call(ToolCall::new("y", "store").depends_on("x"));
        assert!(matches!(
            merge_plans(&[a, b], MergeMode::Strict),
            Err(PlanValidationError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_merge_of_nothing_is_empty_plan() {
        assert_eq!(
            merge_plans(&[], MergeMode::Strict),
            Err(PlanValidationError::EmptyPlan)
        );
    }
}
