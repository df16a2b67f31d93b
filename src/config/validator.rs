//! Config validation: schema invariants and rule sanity.

use crate::config::{CrudConfig, FieldSchema};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

pub fn validate_schema(model: &str, schema: &FieldSchema) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for field in schema {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "model '{}' has a field with an empty name",
                model
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(ConfigError::DuplicateField {
                model: model.to_string(),
                field: field.name.clone(),
            });
        }
        if field.reference_label_field.is_some() && !field.is_reference() {
            return Err(ConfigError::LabelOnNonReference {
                field: field.name.clone(),
            });
        }
        if let Some(pattern) = &field.validation.pattern {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("invalid pattern for {}: {}", field.name, e))
            })?;
        }
        if let (Some(min), Some(max)) = (field.validation.minimum, field.validation.maximum) {
            if min > max {
                return Err(ConfigError::Validation(format!(
                    "{}: minimum {} exceeds maximum {}",
                    field.name, min, max
                )));
            }
        }
    }
    Ok(())
}

pub fn validate(config: &CrudConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model name must not be empty".into()));
    }
    if config.display_name.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "model '{}' needs a display name",
            config.model
        )));
    }
    validate_schema(&config.model, &config.fields)
}
