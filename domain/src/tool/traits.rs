//! Tool domain traits
//!
//! Contains pure domain logic traits for parameter validation.
//! Dispatch itself is an application-layer port.

use serde_json::{Map, Value};

use super::entities::ToolDefinition;
use super::value_objects::ToolError;

/// Validator for call parameters
///
/// Validates parameters against a tool's declared definition without any I/O.
pub trait ToolValidator {
    fn validate(
        &self,
        params: &Map<String, Value>,
        definition: &ToolDefinition,
    ) -> Result<(), ToolError>;
}

/// Checks required, unknown, and declared-type parameters
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(
        &self,
        params: &Map<String, Value>,
        definition: &ToolDefinition,
    ) -> Result<(), ToolError> {
        for param in &definition.parameters {
            if param.required && !params.contains_key(&param.name) {
                return Err(ToolError::invalid_argument(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, definition.name
                )));
            }
        }

        for (name, value) in params {
            let Some(param) = definition.parameter(name) else {
                return Err(ToolError::invalid_argument(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    name, definition.name
                )));
            };
            if !param.param_type.accepts(value) {
                return Err(ToolError::invalid_argument(format!(
                    "Parameter '{}' for tool '{}' must be {}",
                    name, definition.name, param.param_type
                )));
            }
        }

        Ok(())
    }
}
