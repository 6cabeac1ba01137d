//! Planner
//!
//! Turns an intent into a validated [`Plan`] over the current catalog.
//!
//! # Tool selection
//!
//! Capability tags are extracted from the intent with the
//! [`CapabilityVocabulary`]. Tools are ranked against all intent tags
//! (overlap first, then success rate, latency and name). Walking the tags in
//! order of appearance, each tag not yet covered by a selected tool picks the
//! best-ranked unused tool offering it.
//!
//! # Arrangement
//!
//! ```text
//! linear:   search ──▶ store ──▶ notify       (each step feeds the next)
//!
//! hinted:   search ──▶ store                  hints: store <- search,
//!                └───▶ notify                        notify <- search
//! ```
//!
//! Hints that are cyclic or name tools the selection did not pick are
//! ignored with a warning and the linear arrangement is used instead.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use toolweave_domain::plan::validation::{check_graph, stable_order};
use toolweave_domain::tool::rank;
use toolweave_domain::{
    CapabilityVocabulary, MergeMode, Plan, PlanId, PlanValidationError, SnapshotError, ToolCall,
    ToolDescriptor, export_plan, import_plan, merge_plans,
};
use tracing::{debug, info, warn};

use crate::catalog::CatalogSnapshot;

/// Explicit arrangement: tool name → tools whose output it consumes
pub type DependencyHints = BTreeMap<String, Vec<String>>;

/// Parameter key used for tools that declare no parameters
pub const DEFAULT_INPUT_KEY: &str = "input";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("No known capability found in intent: {intent:?}")]
    NoCapabilities { intent: String },

    #[error("No tool offers any of the requested capabilities: {}", .tags.join(", "))]
    NoMatchingTools { tags: Vec<String> },

    #[error(transparent)]
    Invalid(#[from] PlanValidationError),
}

/// A selected tool and the intent tags it was picked for
#[derive(Debug, Clone)]
pub struct Selection {
    pub tool: ToolDescriptor,
    pub covers: Vec<String>,
}

pub struct Planner {
    vocabulary: CapabilityVocabulary,
}

impl Planner {
    pub fn new(vocabulary: CapabilityVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &CapabilityVocabulary {
        &self.vocabulary
    }

    /// Capability tags in the intent, in order of first appearance
    pub fn intent_tags(&self, intent: &str) -> Vec<String> {
        self.vocabulary.extract(intent)
    }

    /// Pick tools covering the tags
    ///
    /// Tags that no tool offers are skipped; an empty result means nothing
    /// matched at all.
    pub fn select(&self, tags: &[String], snapshot: &CatalogSnapshot) -> Vec<Selection> {
        let descriptors = snapshot.descriptors();
        let ranked = rank(tags, &descriptors);
        let mut selections: Vec<Selection> = Vec::new();

        for tag in tags {
            if let Some(existing) = selections.iter_mut().find(|s| s.tool.has_capability(tag)) {
                existing.covers.push(tag.clone());
                continue;
            }
            let pick = ranked
                .iter()
                .map(|(tool, _)| *tool)
                .find(|tool| {
                    tool.has_capability(tag) && !selections.iter().any(|s| s.tool.name == tool.name)
                });
            match pick {
                Some(tool) => {
                    debug!(tag = %tag, tool = %tool.name, "Selected tool for capability");
                    selections.push(Selection {
                        tool: tool.clone(),
                        covers: vec![tag.clone()],
                    });
                }
                None => warn!(tag = %tag, "No tool offers capability"),
            }
        }

        selections
    }

    /// Build and validate a plan for `intent`
    pub fn build_plan(
        &self,
        intent: &str,
        snapshot: &CatalogSnapshot,
        hints: Option<&DependencyHints>,
    ) -> Result<Plan, PlanningError> {
        let tags = self.intent_tags(intent);
        if tags.is_empty() {
            return Err(PlanningError::NoCapabilities {
                intent: intent.to_string(),
            });
        }

        let selections = self.select(&tags, snapshot);
        if selections.is_empty() {
            return Err(PlanningError::NoMatchingTools { tags });
        }

        let calls = match hints.filter(|h| !h.is_empty()) {
            Some(hints) => match hinted_calls(intent, &selections, hints) {
                Ok(calls) => calls,
                Err(reason) => {
                    warn!(%reason, "Ignoring dependency hints, planning linearly");
                    linear_calls(intent, &selections)
                }
            },
            None => linear_calls(intent, &selections),
        };

        let plan = Plan {
            id: PlanId::generate(),
            intent: intent.to_string(),
            calls,
        };
        plan.validate()?;

        info!(
            plan_id = %plan.id,
            calls = plan.len(),
            tags = tags.len(),
            "Plan built"
        );
        Ok(plan)
    }

    pub fn validate(&self, plan: &Plan) -> Result<(), PlanValidationError> {
        plan.validate()
    }

    pub fn merge(&self, plans: &[Plan], mode: MergeMode) -> Result<Plan, PlanValidationError> {
        merge_plans(plans, mode)
    }

    pub fn export(&self, plan: &Plan) -> Result<String, SnapshotError> {
        export_plan(plan)
    }

    pub fn import(&self, text: &str) -> Result<Plan, SnapshotError> {
        import_plan(text)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(CapabilityVocabulary::default())
    }
}

/// Parameter receiving the upstream input: the first required parameter,
/// else the first declared one, else [`DEFAULT_INPUT_KEY`]
fn input_key(tool: &ToolDescriptor) -> &str {
    tool.parameters
        .iter()
        .find(|p| p.required)
        .or_else(|| tool.parameters.first())
        .map(|p| p.name.as_str())
        .unwrap_or(DEFAULT_INPUT_KEY)
}

fn placeholder(id: &str) -> Value {
    Value::String(format!("${{{}}}", id))
}

fn call_for(intent: &str, tool: &ToolDescriptor, deps: &[String]) -> ToolCall {
    let input = match deps {
        [] => Value::String(intent.to_string()),
        [single] => placeholder(single),
        many => Value::Object(
            many.iter()
                .map(|d| (d.clone(), placeholder(d)))
                .collect::<Map<String, Value>>(),
        ),
    };
    deps.iter().fold(
        ToolCall::new(tool.name.as_str(), tool.name.as_str()).with_param(input_key(tool), input),
        |call, dep| call.depends_on(dep.as_str()),
    )
}

fn linear_calls(intent: &str, selections: &[Selection]) -> Vec<ToolCall> {
    let mut previous: Option<String> = None;
    selections
        .iter()
        .map(|s| {
            let deps: Vec<String> = previous.iter().cloned().collect();
            previous = Some(s.tool.name.clone());
            call_for(intent, &s.tool, &deps)
        })
        .collect()
}

fn hinted_calls(
    intent: &str,
    selections: &[Selection],
    hints: &DependencyHints,
) -> Result<Vec<ToolCall>, String> {
    let selected: HashSet<&str> = selections.iter().map(|s| s.tool.name.as_str()).collect();
    for (tool, deps) in hints {
        if let Some(unknown) = std::iter::once(tool)
            .chain(deps.iter())
            .find(|name| !selected.contains(name.as_str()))
        {
            return Err(format!("hint references unselected tool '{}'", unknown));
        }
    }

    let calls: Vec<ToolCall> = selections
        .iter()
        .map(|s| {
            let deps = hints.get(&s.tool.name).cloned().unwrap_or_default();
            call_for(intent, &s.tool, &deps)
        })
        .collect();

    check_graph(&calls).map_err(|e| e.to_string())?;
    let order = stable_order(&calls);
    let mut slots: Vec<Option<ToolCall>> = calls.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SourceBatch;
    use serde_json::json;
    use std::time::Duration;
    use toolweave_domain::{Categorizer, SourceKind, ToolDefinition, ToolParameter};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::build(
            vec![
                SourceBatch {
                    source: "builtin".into(),
                    kind: SourceKind::Internal,
                    tools: vec![
                        ToolDefinition::new("search", "").with_capability("search"),
                        ToolDefinition::new("grep_search", "")
                            .with_capability("search")
                            .with_parameter(ToolParameter::new("pattern", "Regex", true)),
                    ],
                },
                SourceBatch {
                    source: "proxy".into(),
                    kind: SourceKind::Proxy,
                    tools: vec![
                        ToolDefinition::new("store", "").with_capability("store"),
                        ToolDefinition::new("notify", "").with_capability("notify"),
                        ToolDefinition::new("archive_and_alert", "")
                            .with_capabilities(["store", "notify"]),
                    ],
                },
            ],
            &Categorizer::default(),
            &CapabilityVocabulary::default(),
            None,
        )
    }

    fn ids(plan: &Plan) -> Vec<&str> {
        plan.calls.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_linear_plan_chains_steps() {
        let snapshot = snapshot();
        snapshot.record_outcome("grep_search", false, Duration::from_millis(5));

        let plan = Planner::default()
            .build_plan("search for rust news, then store and notify", &snapshot, None)
            .unwrap();

        // archive_and_alert covers two tags, so it outranks store and notify
        assert_eq!(ids(&plan), vec!["search", "archive_and_alert"]);
        let second = &plan.calls[1];
        assert!(second.has_dependency("search"));
        assert_eq!(second.params.get("input"), Some(&json!("${search}")));
        assert_eq!(
            plan.calls[0].params.get("input"),
            Some(&json!("search for rust news, then store and notify"))
        );
    }

    #[test]
    fn test_tie_broken_by_success_rate() {
        let snapshot = snapshot();
        snapshot.record_outcome("search", false, Duration::from_millis(5));

        let plan = Planner::default()
            .build_plan("find the file", &snapshot, None)
            .unwrap();
        assert_eq!(ids(&plan), vec!["grep_search"]);
        // Declared required parameter receives the input
        assert_eq!(plan.calls[0].params.get("pattern"), Some(&json!("find the file")));
    }

    fn three_tools() -> CatalogSnapshot {
        CatalogSnapshot::build(
            vec![SourceBatch {
                source: "proxy".into(),
                kind: SourceKind::Proxy,
                tools: vec![
                    ToolDefinition::new("search", "").with_capability("search"),
                    ToolDefinition::new("store", "").with_capability("store"),
                    ToolDefinition::new("notify", "").with_capability("notify"),
                ],
            }],
            &Categorizer::default(),
            &CapabilityVocabulary::default(),
            None,
        )
    }

    #[test]
    fn test_hinted_plan_with_selected_tools() {
        let hints: DependencyHints = [
            ("search".to_string(), vec!["store".to_string()]),
            ("notify".to_string(), vec!["search".to_string(), "store".to_string()]),
        ]
        .into_iter()
        .collect();

        let plan = Planner::default()
            .build_plan("search, store, notify", &three_tools(), Some(&hints))
            .unwrap();

        // store has no dependencies, so it moves ahead of search
        assert_eq!(ids(&plan), vec!["store", "search", "notify"]);
        assert_eq!(
            plan.calls[0].params.get("input"),
            Some(&json!("search, store, notify"))
        );
        assert_eq!(plan.calls[1].params.get("input"), Some(&json!("${store}")));
        assert_eq!(
            plan.calls[2].params.get("input"),
            Some(&json!({"search": "${search}", "store": "${store}"}))
        );
    }

    #[test]
    fn test_hints_naming_unselected_tool_fall_back_to_linear() {
        let hints: DependencyHints =
            [("store".to_string(), vec!["ghost".to_string()])].into_iter().collect();

        let plan = Planner::default()
            .build_plan("search then notify", &three_tools(), Some(&hints))
            .unwrap();
        assert_eq!(ids(&plan), vec!["search", "notify"]);
        assert!(plan.calls[1].has_dependency("search"));
    }

    #[test]
    fn test_cyclic_hints_fall_back_to_linear() {
        let snapshot = CatalogSnapshot::build(
            vec![SourceBatch {
                source: "proxy".into(),
                kind: SourceKind::Proxy,
                tools: vec![
                    ToolDefinition::new("search", "").with_capability("search"),
                    ToolDefinition::new("store", "").with_capability("store"),
                ],
            }],
            &Categorizer::default(),
            &CapabilityVocabulary::default(),
            None,
        );
        let hints: DependencyHints = [
            ("search".to_string(), vec!["store".to_string()]),
            ("store".to_string(), vec!["search".to_string()]),
        ]
        .into_iter()
        .collect();

        let plan = Planner::default()
            .build_plan("search and store", &snapshot, Some(&hints))
            .unwrap();
        assert_eq!(ids(&plan), vec!["search", "store"]);
        assert!(plan.calls[1].has_dependency("search"));
    }

    #[test]
    fn test_no_capabilities_and_no_tools() {
        let planner = Planner::default();
        let snapshot = snapshot();

        assert!(matches!(
            planner.build_plan("hello there", &snapshot, None),
            Err(PlanningError::NoCapabilities { .. })
        ));
        assert_eq!(
            planner.build_plan("transcribe the audio", &snapshot, None),
            Err(PlanningError::NoMatchingTools {
                tags: vec!["transcribe".into()]
            })
        );
    }

    #[test]
    fn test_export_import_roundtrip() {
        let planner = Planner::default();
        let plan = planner
            .build_plan("search and store", &snapshot(), None)
            .unwrap();

        let text = planner.export(&plan).unwrap();
        let imported = planner.import(&text).unwrap();
        assert_eq!(imported, plan);
        assert_eq!(planner.export(&imported).unwrap(), text);
    }
}
