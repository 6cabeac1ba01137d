//! Self-describing snapshot documents
//!
//! Plans and execution states are exported as JSON documents that name their
//! schema and version next to the body:
//!
//! ```json
//! { "schema": "toolweave.plan", "version": 1, "plan": { ... } }
//! ```
//!
//! Import rejects documents of another schema and versions newer than this
//! build understands.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::entities::Plan;

pub const PLAN_SCHEMA: &str = "toolweave.plan";
pub const EXECUTION_SCHEMA: &str = "toolweave.execution";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Expected a '{expected}' snapshot, found '{found}'")]
    WrongSchema { expected: String, found: String },

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u32 },
}

/// Wrap a body in a versioned envelope and render it as pretty JSON
pub fn export_document<T: Serialize>(
    schema: &str,
    body_key: &str,
    body: &T,
) -> Result<String, SnapshotError> {
    let mut document = Map::new();
    document.insert("schema".into(), Value::from(schema));
    document.insert("version".into(), Value::from(SNAPSHOT_VERSION));
    document.insert(body_key.into(), serde_json::to_value(body)?);
    Ok(serde_json::to_string_pretty(&Value::Object(document))?)
}

/// Check a document's envelope and decode its body
pub fn import_document<T: DeserializeOwned>(
    schema: &str,
    body_key: &'static str,
    text: &str,
) -> Result<T, SnapshotError> {
    let mut document: Map<String, Value> = serde_json::from_str(text)?;

    let found = document
        .get("schema")
        .and_then(Value::as_str)
        .ok_or(SnapshotError::MissingField("schema"))?;
    if found != schema {
        return Err(SnapshotError::WrongSchema {
            expected: schema.to_string(),
            found: found.to_string(),
        });
    }

    let version = document
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(SnapshotError::MissingField("version"))?;
    if version > u64::from(SNAPSHOT_VERSION) {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }

    let body = document
        .remove(body_key)
        .ok_or(SnapshotError::MissingField(body_key))?;
    Ok(serde_json::from_value(body)?)
}

pub fn export_plan(plan: &Plan) -> Result<String, SnapshotError> {
    export_document(PLAN_SCHEMA, "plan", plan)
}

pub fn import_plan(text: &str) -> Result<Plan, SnapshotError> {
    import_document(PLAN_SCHEMA, "plan", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::entities::ToolCall;
    use serde_json::json;
    use std::time::Duration;

    fn sample() -> Plan {
        Plan::new("plan-1", "search, store and notify")
            .with_call(ToolCall::new("search", "search").with_param("input", "rust"))
            .with_call(
                ToolCall::new("store", "store")
                    .with_param("input", "${search.items}")
                    .with_param("meta", json!({"tags": ["a", "b"], "n": 2.5}))
                    .depends_on("search")
                    .with_timeout(Duration::from_millis(800))
                    .with_max_retries(1),
            )
            .with_call(ToolCall::new("notify", "notify").depends_on("store"))
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let plan = sample();
        let exported = export_plan(&plan).unwrap();
        let imported = import_plan(&exported).unwrap();
        assert_eq!(imported, plan);
        assert_eq!(export_plan(&imported).unwrap(), exported);
    }

    #[test]
    fn test_round_trip_preserves_float_params() {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut floats = vec![
            0.9749512713538497,
            0.9050670628910671,
            0.20153789807968714,
            1.0372794798492697,
        ];
        for _ in 0..2000 {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            floats.push((seed >> 11) as f64 / (1u64 << 53) as f64 * 4.0);
        }

        for chunk in floats.chunks(4) {
            let plan = Plan::new("plan-f", "measure").with_call(
                ToolCall::new("measure", "measure").with_param("values", json!(chunk)),
            );
            let exported = export_plan(&plan).unwrap();
            let reexported = export_plan(&import_plan(&exported).unwrap()).unwrap();
            assert_eq!(reexported, exported, "values {:?}", chunk);
        }
    }

    #[test]
    fn test_document_is_self_describing() {
        let exported = export_plan(&sample()).unwrap();
        let value: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["schema"], json!("toolweave.plan"));
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["plan"]["calls"][1]["depends_on"], json!(["search"]));
    }

    #[test]
    fn test_rejects_wrong_schema() {
        let text = json!({"schema": "toolweave.execution", "version": 1, "plan": {}}).to_string();
        assert!(matches!(
            import_plan(&text),
            Err(SnapshotError::WrongSchema { .. })
        ));
    }

    #[test]
    fn test_rejects_newer_version() {
        let text = json!({"schema": "toolweave.plan", "version": 7, "plan": {}}).to_string();
        assert!(matches!(
            import_plan(&text),
            Err(SnapshotError::UnsupportedVersion { found: 7, .. })
        ));
    }

    #[test]
    fn test_missing_fields() {
        let text = json!({"version": 1}).to_string();
        assert!(matches!(
            import_plan(&text),
            Err(SnapshotError::MissingField("schema"))
        ));

        let text = json!({"schema": "toolweave.plan", "version": 1}).to_string();
        assert!(matches!(
            import_plan(&text),
            Err(SnapshotError::MissingField("plan"))
        ));
    }

    #[test]
    fn test_garbage_is_json_error() {
        assert!(matches!(import_plan("not json"), Err(SnapshotError::Json(_))));
    }
}
