//! Declared parameter and response schemas for proxy tools
//!
//! A proxy tool may name and type its parameters differently from the
//! engine's canonical call. [`ParameterSchema`] declares, per tool, how
//! canonical parameter keys map to the target's keys and which type
//! conversion (if any) is applied. Nothing is coerced implicitly: a value is
//! converted only when its mapping names a target [`ParamType`].
//!
//! The same schema carries a [`ResponseMapping`] describing where the
//! target's payload and application-level error signal live in its raw JSON
//! response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value_objects::{ToolError, ToolResult};

/// Declared parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    #[default]
    Any,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Any => "any",
        }
    }

    /// Whether a value already has this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
            ParamType::Any => true,
        }
    }

    /// Convert a value to this type, or explain why it cannot be converted
    pub fn convert(&self, value: &Value) -> Result<Value, String> {
        if self.accepts(value) {
            return Ok(value.clone());
        }

        let converted = match (self, value) {
            (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ParamType::String, Value::Array(_) | Value::Object(_)) => {
                Some(Value::String(value.to_string()))
            }
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (ParamType::Integer, Value::Number(n)) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| Value::from(f as i64)),
            (ParamType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            (ParamType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (ParamType::Array, other) if !other.is_null() => {
                Some(Value::Array(vec![other.clone()]))
            }
            _ => None,
        };

        converted.ok_or_else(|| format!("cannot convert {} to {}", value, self.as_str()))
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mapping of one canonical parameter onto the target schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMapping {
    /// Canonical parameter key
    pub from: String,
    /// Key expected by the target
    pub to: String,
    /// Conversion applied to the value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert: Option<ParamType>,
}

impl ParamMapping {
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            convert: None,
        }
    }

    pub fn with_conversion(mut self, target: ParamType) -> Self {
        self.convert = Some(target);
        self
    }
}

/// Where a target's payload and failure signal live in its raw response
///
/// Pointers use JSON Pointer syntax (RFC 6901), e.g. `/result/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMapping {
    /// Sub-document holding the payload (whole response when unset)
    pub payload_pointer: Option<String>,
    /// Field holding an error value; non-null, non-false means failure
    pub error_pointer: Option<String>,
    /// Boolean field that signals failure when `true`
    pub error_flag_pointer: Option<String>,
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self {
            payload_pointer: None,
            error_pointer: Some("/error".to_string()),
            error_flag_pointer: Some("/isError".to_string()),
        }
    }
}

/// Per-tool declared schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSchema {
    /// Declared key/type mappings
    pub mappings: Vec<ParamMapping>,
    /// Copy parameters without a mapping unchanged (otherwise reject them)
    pub pass_through: bool,
    /// Response normalization rules
    pub response: ResponseMapping,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            mappings: Vec::new(),
            pass_through: true,
            response: ResponseMapping::default(),
        }
    }
}

impl ParameterSchema {
    pub fn with_mapping(mut self, mapping: ParamMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn strict(mut self) -> Self {
        self.pass_through = false;
        self
    }

    pub fn with_response(mut self, response: ResponseMapping) -> Self {
        self.response = response;
        self
    }

    /// Translate canonical parameters into the target schema
    pub fn translate(&self, params: &Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
        let mut translated = Map::new();

        for mapping in &self.mappings {
            let Some(value) = params.get(&mapping.from) else {
                continue;
            };
            let value = match mapping.convert {
                Some(target) => target.convert(value).map_err(|e| {
                    ToolError::invalid_argument(format!("parameter '{}': {}", mapping.from, e))
                })?,
                None => value.clone(),
            };
            translated.insert(mapping.to.clone(), value);
        }

        for (key, value) in params {
            if self.mappings.iter().any(|m| &m.from == key) {
                continue;
            }
            if !self.pass_through {
                return Err(ToolError::invalid_argument(format!(
                    "parameter '{}' has no declared mapping",
                    key
                )));
            }
            translated.entry(key.clone()).or_insert_with(|| value.clone());
        }

        Ok(translated)
    }

    /// Normalize a raw target response into the canonical result shape
    pub fn normalize_response(&self, tool_name: &str, raw: Value) -> ToolResult {
        let rules = &self.response;

        let flagged = rules
            .error_flag_pointer
            .as_deref()
            .and_then(|p| raw.pointer(p))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let error_value = rules
            .error_pointer
            .as_deref()
            .and_then(|p| raw.pointer(p))
            .filter(|v| !v.is_null() && v.as_bool() != Some(false))
            .cloned();

        let payload = match rules.payload_pointer.as_deref() {
            Some(pointer) => raw.pointer(pointer).cloned(),
            None => Some(raw.clone()),
        };

        if flagged || error_value.is_some() {
            let error = error_from_value(error_value.as_ref(), &raw);
            return match payload {
                Some(payload) => ToolResult::partial(tool_name, payload, error),
                None => ToolResult::failure(tool_name, error),
            };
        }

        match payload {
            Some(payload) => ToolResult::success(tool_name, payload),
            None => ToolResult::failure(
                tool_name,
                ToolError::remote(format!(
                    "response has no payload at '{}'",
                    rules.payload_pointer.as_deref().unwrap_or_default()
                ))
                .with_details(raw.to_string()),
            ),
        }
    }
}

/// Build a structured error from a target's error value
fn error_from_value(error: Option<&Value>, raw: &Value) -> ToolError {
    match error {
        Some(Value::String(message)) => ToolError::remote(message.clone()),
        Some(Value::Object(fields)) => {
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(fields.clone()).to_string());
            let code = fields
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or(ToolError::REMOTE_ERROR);
            ToolError::new(code, message)
        }
        Some(other) => ToolError::remote(other.to_string()),
        None => {
            // Flagged without an error field: use any text content as message
            let message = raw
                .pointer("/content/0/text")
                .and_then(Value::as_str)
                .unwrap_or("tool reported an error");
            ToolError::remote(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_translate_renames_and_converts() {
        let schema = ParameterSchema::default()
            .with_mapping(ParamMapping::rename("query", "q"))
            .with_mapping(ParamMapping::rename("limit", "max").with_conversion(ParamType::Integer));

        let out = schema
            .translate(&params(json!({"query": "rust", "limit": "10", "lang": "en"})))
            .unwrap();

        assert_eq!(out.get("q"), Some(&json!("rust")));
        assert_eq!(out.get("max"), Some(&json!(10)));
        assert_eq!(out.get("lang"), Some(&json!("en")));
        assert!(!out.contains_key("query"));
    }

    #[test]
    fn test_translate_does_not_coerce_without_mapping() {
        let schema = ParameterSchema::default()
            .with_mapping(ParamMapping::rename("limit", "max"));
        let out = schema.translate(&params(json!({"limit": "10"}))).unwrap();
        assert_eq!(out.get("max"), Some(&json!("10")));
    }

    #[test]
    fn test_translate_conversion_failure_is_invalid_argument() {
        let schema = ParameterSchema::default()
            .with_mapping(ParamMapping::rename("limit", "max").with_conversion(ParamType::Integer));
        let err = schema.translate(&params(json!({"limit": "ten"}))).unwrap_err();
        assert_eq!(err.code, ToolError::INVALID_ARGUMENT);
        assert!(err.message.contains("limit"));
    }

    #[test]
    fn test_strict_schema_rejects_unmapped() {
        let schema = ParameterSchema::default()
            .with_mapping(ParamMapping::rename("query", "q"))
            .strict();
        let err = schema
            .translate(&params(json!({"query": "x", "extra": 1})))
            .unwrap_err();
        assert!(err.message.contains("extra"));
    }

    #[test]
    fn test_param_type_conversions() {
        assert_eq!(ParamType::String.convert(&json!(42)).unwrap(), json!("42"));
        assert_eq!(ParamType::Boolean.convert(&json!("TRUE")).unwrap(), json!(true));
        assert_eq!(ParamType::Number.convert(&json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(ParamType::Array.convert(&json!("a")).unwrap(), json!(["a"]));
        assert!(ParamType::Integer.convert(&json!(2.5)).is_err());
        assert!(ParamType::Object.convert(&json!("x")).is_err());
    }

    #[test]
    fn test_normalize_plain_success() {
        let schema = ParameterSchema::default();
        let result = schema.normalize_response("store", json!({"id": 7}));
        assert!(result.is_success());
        assert_eq!(result.payload(), Some(&json!({"id": 7})));
    }

    #[test]
    fn test_normalize_payload_pointer() {
        let schema = ParameterSchema::default().with_response(ResponseMapping {
            payload_pointer: Some("/result".to_string()),
            ..ResponseMapping::default()
        });
        let result = schema.normalize_response("store", json!({"result": [1, 2]}));
        assert_eq!(result.payload(), Some(&json!([1, 2])));

        let missing = schema.normalize_response("store", json!({"other": 1}));
        assert!(!missing.is_success());
        assert_eq!(missing.error().unwrap().code, ToolError::REMOTE_ERROR);
    }

    #[test]
    fn test_normalize_surfaces_application_failure() {
        let schema = ParameterSchema::default();
        let result = schema.normalize_response(
            "store",
            json!({"written": 1, "error": {"code": "PERMISSION_DENIED", "message": "read-only"}}),
        );

        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().code, "PERMISSION_DENIED");
        assert_eq!(result.error().unwrap().message, "read-only");
        // Partial data is preserved
        assert_eq!(result.payload().unwrap()["written"], json!(1));
    }

    #[test]
    fn test_normalize_error_flag() {
        let schema = ParameterSchema::default();
        let result = schema.normalize_response(
            "notify",
            json!({"isError": true, "content": [{"type": "text", "text": "channel missing"}]}),
        );
        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().message, "channel missing");
    }

    #[test]
    fn test_normalize_ignores_null_and_false_errors() {
        let schema = ParameterSchema::default();
        assert!(schema.normalize_response("x", json!({"error": null})).is_success());
        assert!(schema.normalize_response("x", json!({"error": false})).is_success());
        assert!(schema.normalize_response("x", json!({"isError": false})).is_success());
    }
}
