use jsonschema::validator_for;
use serde_json::Value;

use crate::adapters::ToolDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("Instance validation failed: {0}")]
    ValidationFailed(String),
}

/// Validate a JSON instance against a JSON Schema.
pub fn validate_json(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    let validator =
        validator_for(schema).map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    let first = validator.iter_errors(instance).next().map(|e| e.to_string());
    match first {
        None => Ok(()),
        Some(err) => Err(SchemaValidationError::ValidationFailed(err)),
    }
}

/// Check that a descriptor's `inputSchema` is itself a usable object schema.
pub fn check_descriptor(descriptor: &ToolDescriptor) -> Result<(), SchemaValidationError> {
    validator_for(&descriptor.input_schema)
        .map_err(|e| SchemaValidationError::SchemaCompile(format!("{}: {e}", descriptor.name)))?;

    if descriptor.input_schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(SchemaValidationError::SchemaCompile(format!(
            "{}: inputSchema must describe an object",
            descriptor.name
        )));
    }
    Ok(())
}
