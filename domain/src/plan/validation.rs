//! Plan validation
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. the plan is not empty
//! 2. call IDs are unique
//! 3. every dependency names a call in the plan
//! 4. the dependency graph has no cycle (depth-first search; the error names
//!    the cycle members in traversal order, a self-dependency is a cycle of one)
//! 5. no call depends on a call declared after it
//!
//! Cycle detection runs before the ordering check so a cyclic plan is always
//! reported as such rather than as a forward reference.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::entities::{CallId, ToolCall};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanValidationError {
    #[error("Plan has no calls")]
    EmptyPlan,

    #[error("Duplicate call id '{0}'")]
    DuplicateCallId(CallId),

    #[error("Call '{id}' is declared differently in merged plans")]
    ConflictingDuplicate { id: CallId },

    #[error("Call '{call}' depends on unknown call '{dependency}'")]
    UnknownDependency { call: CallId, dependency: CallId },

    #[error("Circular dependency: {}", format_cycle(.cycle))]
    CircularDependency { cycle: Vec<CallId> },

    #[error("Call '{call}' depends on '{dependency}', which is declared after it")]
    ForwardDependency { call: CallId, dependency: CallId },
}

fn format_cycle(cycle: &[CallId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(CallId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

/// Full validation, including declared-order checks
pub fn validate(calls: &[ToolCall]) -> Result<(), PlanValidationError> {
    let index = check_graph(calls)?;

    for (position, call) in calls.iter().enumerate() {
        for dep in &call.depends_on {
            if index[dep.as_str()] > position {
                return Err(PlanValidationError::ForwardDependency {
                    call: call.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Graph checks only (steps 1 to 4); declared order is not considered
///
/// Returns the position of every call ID.
pub fn check_graph(calls: &[ToolCall]) -> Result<HashMap<&str, usize>, PlanValidationError> {
    if calls.is_empty() {
        return Err(PlanValidationError::EmptyPlan);
    }

    let mut index = HashMap::with_capacity(calls.len());
    for (position, call) in calls.iter().enumerate() {
        if index.insert(call.id.as_str(), position).is_some() {
            return Err(PlanValidationError::DuplicateCallId(call.id.clone()));
        }
    }

    for call in calls {
        if let Some(dep) = call
            .depends_on
            .iter()
            .find(|d| !index.contains_key(d.as_str()))
        {
            return Err(PlanValidationError::UnknownDependency {
                call: call.id.clone(),
                dependency: dep.clone(),
            });
        }
    }

    if let Some(cycle) = find_cycle(calls, &index) {
        return Err(PlanValidationError::CircularDependency { cycle });
    }

    Ok(index)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Iterative depth-first search over dependency edges
fn find_cycle(calls: &[ToolCall], index: &HashMap<&str, usize>) -> Option<Vec<CallId>> {
    let mut marks = vec![Mark::Unvisited; calls.len()];

    for root in 0..calls.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        // (node, next dependency to visit)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        marks[root] = Mark::OnStack;

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let deps = &calls[node].depends_on;
            if next < deps.len() {
                top.1 += 1;
                let dep = index[deps[next].as_str()];
                match marks[dep] {
                    Mark::Unvisited => {
                        marks[dep] = Mark::OnStack;
                        stack.push((dep, 0));
                    }
                    Mark::OnStack => {
                        let start = stack.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                        return Some(
                            stack[start..]
                                .iter()
                                .map(|(n, _)| calls[*n].id.clone())
                                .collect(),
                        );
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    None
}

/// Stable topological order (Kahn): among ready calls, declared order wins
///
/// Assumes [`check_graph`] passed.
pub fn stable_order(calls: &[ToolCall]) -> Vec<usize> {
    let mut emitted: HashSet<&str> = HashSet::with_capacity(calls.len());
    let mut placed = vec![false; calls.len()];
    let mut order = Vec::with_capacity(calls.len());

    while order.len() < calls.len() {
        let next = calls.iter().enumerate().find(|(i, call)| {
            !placed[*i]
                && call
                    .depends_on
                    .iter()
                    .all(|d| emitted.contains(d.as_str()))
        });
        let Some((i, call)) = next else {
            break;
        };
        placed[i] = true;
        emitted.insert(call.id.as_str());
        order.push(i);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, deps: &[&str]) -> ToolCall {
        deps.iter()
            .fold(ToolCall::new(id, "tool"), |c, d| c.depends_on(*d))
    }

    fn ids(cycle: &[CallId]) -> Vec<&str> {
        cycle.iter().map(CallId::as_str).collect()
    }

    #[test]
    fn test_valid_chain() {
        let calls = vec![call("a", &[]), call("b", &["a"]), call("c", &["b"])];
        assert!(validate(&calls).is_ok());
    }

    #[test]
    fn test_empty_plan() {
        assert_eq!(validate(&[]), Err(PlanValidationError::EmptyPlan));
    }

    #[test]
    fn test_duplicate_id() {
        let calls = vec![call("a", &[]), call("a", &[])];
        assert_eq!(
            validate(&calls),
            Err(PlanValidationError::DuplicateCallId(CallId::new("a")))
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let calls = vec![call("a", &[]), call("b", &["ghost"])];
        assert_eq!(
            validate(&calls),
            Err(PlanValidationError::UnknownDependency {
                call: CallId::new("b"),
                dependency: CallId::new("ghost"),
            })
        );
    }

    #[test]
    fn test_forward_dependency() {
        let calls = vec![call("a", &["b"]), call("b", &[])];
        assert_eq!(
            validate(&calls),
            Err(PlanValidationError::ForwardDependency {
                call: CallId::new("a"),
                dependency: CallId::new("b"),
            })
        );
    }

    #[test]
    fn test_cycle_names_members() {
        let calls = vec![
            call("root", &[]),
            call("a", &["root", "c"]),
            call("b", &["a"]),
            call("c", &["b"]),
        ];
        match validate(&calls) {
            Err(PlanValidationError::CircularDependency { cycle }) => {
                assert_eq!(ids(&cycle), vec!["a", "c", "b"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_reported_before_forward_dependency() {
        let calls = vec![call("a", &["b"]), call("b", &["a"])];
        assert!(matches!(
            validate(&calls),
            Err(PlanValidationError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_self_dependency_is_cycle_of_one() {
        let calls = vec![call("a", &["a"])];
        let err = validate(&calls).unwrap_err();
        assert_eq!(
            err,
            PlanValidationError::CircularDependency {
                cycle: vec![CallId::new("a")]
            }
        );
        assert_eq!(err.to_string(), "Circular dependency: a -> a");
    }

    #[test]
    fn test_stable_order() {
        let calls = vec![
            call("c", &["b"]),
            call("a", &[]),
            call("d", &[]),
            call("b", &["a"]),
        ];
        assert!(check_graph(&calls).is_ok());
        assert_eq!(stable_order(&calls), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_accepted_plans_have_topological_order() {
        // Every accepted plan's declared order is itself topological
        let calls = vec![
            call("a", &[]),
            call("b", &["a"]),
            call("c", &["a"]),
            call("d", &["b", "c"]),
        ];
        validate(&calls).unwrap();
        let order = stable_order(&calls);
        assert_eq!(order.len(), calls.len());
        for (pos, &i) in order.iter().enumerate() {
            for dep in &calls[i].depends_on {
                let dep_pos = order
                    .iter()
                    .position(|&j| calls[j].id == *dep)
                    .unwrap();
                assert!(dep_pos < pos);
            }
        }
    }
}
