//! Plan domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::time::Duration;

use super::validation::{self, PlanValidationError};

/// Identifier of a call within a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for CallId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for CallId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One node of a plan
///
/// Parameter values may contain `${call_id}` or `${call_id.path}`
/// placeholders that are replaced by a dependency's result before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: CallId,
    pub tool_name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<CallId>,
    /// Per-call timeout (engine default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Per-call retry budget (engine default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl ToolCall {
    pub fn new(id: impl Into<CallId>, tool_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            params: Map::new(),
            depends_on: Vec::new(),
            timeout_ms: None,
            max_retries: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn depends_on(mut self, id: impl Into<CallId>) -> Self {
        self.depends_on.push(id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn has_dependency(&self, id: &str) -> bool {
        self.depends_on.iter().any(|d| d.as_str() == id)
    }
}

/// Identifier of a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Time-derived identifier, unique enough to correlate events
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static SEQ: AtomicU32 = AtomicU32::new(0);

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("plan-{:012x}-{:04x}", nanos & 0xffff_ffff_ffff, seq & 0xffff))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for PlanId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finite DAG of tool calls, in declared order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    /// Task description the plan was built for
    #[serde(default)]
    pub intent: String,
    pub calls: Vec<ToolCall>,
}

impl Plan {
    pub fn new(id: impl Into<PlanId>, intent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intent: intent.into(),
            calls: Vec::new(),
        }
    }

    pub fn with_call(mut self, call: ToolCall) -> Self {
        self.calls.push(call);
        self
    }

    pub fn call(&self, id: &str) -> Option<&ToolCall> {
        self.calls.iter().find(|c| c.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn validate(&self) -> Result<(), PlanValidationError> {
        validation::validate(&self.calls)
    }

    /// Group calls into dependency levels
    ///
    /// Level 0 holds calls with no dependencies; every other call sits one
    /// level above its deepest dependency. Within a level, declared order is
    /// kept. Returns indices into [`Plan::calls`].
    pub fn levels(&self) -> Result<Vec<Vec<usize>>, PlanValidationError> {
        self.validate()?;

        let mut depth: Vec<usize> = Vec::with_capacity(self.calls.len());
        let mut levels: Vec<Vec<usize>> = Vec::new();

        // Validation guarantees every dependency precedes its dependent
        for (index, call) in self.calls.iter().enumerate() {
            let level = call
                .depends_on
                .iter()
                .filter_map(|dep| self.calls.iter().position(|c| &c.id == dep))
                .map(|dep_index| depth[dep_index] + 1)
                .max()
                .unwrap_or(0);
            depth.push(level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(index);
        }

        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diamond() -> Plan {
        Plan::new("p", "diamond")
            .with_call(ToolCall::new("a", "search"))
            .with_call(ToolCall::new("b", "fetch").depends_on("a"))
            .with_call(ToolCall::new("c", "read").depends_on("a"))
            .with_call(ToolCall::new("d", "store").depends_on("b").depends_on("c"))
    }

    #[test]
    fn test_tool_call_builder() {
        let call = ToolCall::new("s1", "search")
            .with_param("query", "rust")
            .with_timeout(Duration::from_millis(1500))
            .with_max_retries(2)
            .depends_on("s0");

        assert_eq!(call.params.get("query"), Some(&json!("rust")));
        assert_eq!(call.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(call.max_retries, Some(2));
        assert!(call.has_dependency("s0"));
        assert!(!call.has_dependency("s1"));
    }

    #[test]
    fn test_levels_diamond() {
        let plan = diamond();
        let levels = plan.levels().unwrap();
        assert_eq!(levels, vec![vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_levels_independent_roots() {
        let plan = Plan::new("p", "")
            .with_call(ToolCall::new("a", "x"))
            .with_call(ToolCall::new("b", "y"))
            .with_call(ToolCall::new("c", "z").depends_on("b"));
        assert_eq!(plan.levels().unwrap(), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_levels_rejects_invalid_plan() {
        let plan = Plan::new("p", "").with_call(ToolCall::new("a", "x").depends_on("a"));
        assert!(plan.levels().is_err());
    }

    #[test]
    fn test_call_id_serializes_transparently() {
        let call = ToolCall::new("a", "search").depends_on("root");
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["id"], json!("a"));
        assert_eq!(json["depends_on"], json!(["root"]));
        assert!(json.get("timeout_ms").is_none());
    }

    #[test]
    fn test_generated_plan_ids_differ() {
        let a = PlanId::generate();
        let b = PlanId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("plan-"));
    }
}
