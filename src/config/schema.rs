//! JSON Schema validation for steward configuration

use crate::error::StewardError;
use anyhow::{Result, anyhow};
use jsonschema::Validator;
use serde_json::Value;

/// Get the embedded JSON schema for steward configuration
pub fn get_schema() -> Result<Validator> {
    let schema_str = include_str!("../../docs/schema.json");
    let schema: Value = serde_json::from_str(schema_str)
        .map_err(|e| anyhow!("Failed to parse embedded JSON schema: {}", e))?;

    jsonschema::validator_for(&schema).map_err(|e| anyhow!("Failed to compile JSON schema: {}", e))
}

/// Validate a configuration value against the schema
pub fn validate_against_schema(config: &Value) -> Result<()> {
    let schema = get_schema()?;

    let messages: Vec<String> = schema
        .iter_errors(config)
        .map(|error| format!("  - Path '{}': {}", error.instance_path, error))
        .collect();

    if !messages.is_empty() {
        return Err(StewardError::validation(format!(
            "Configuration does not match the schema:\n{}",
            messages.join("\n")
        ))
        .into());
    }

    Ok(())
}
