//! Load resource definitions from JSON strings or files.

use crate::config::resolved::ResourceRegistry;
use crate::config::types::CrudConfig;
use crate::config::validate;
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Registry file layout: either `{ "resources": [...] }` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Wrapped { resources: Vec<CrudConfig> },
    Bare(Vec<CrudConfig>),
}

/// Parse and validate a single resource definition.
pub fn load_from_str(json: &str) -> Result<CrudConfig, ConfigError> {
    let config: CrudConfig = serde_json::from_str(json)?;
    validate(&config)?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<CrudConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&raw)
}

/// Build a registry from several definitions (validates each, rejects duplicate models).
pub fn resolve(resources: Vec<CrudConfig>) -> Result<ResourceRegistry, ConfigError> {
    let mut by_model = HashMap::new();
    for (i, r) in resources.iter().enumerate() {
        validate(r)?;
        if by_model.insert(r.model.clone(), i).is_some() {
            return Err(ConfigError::Validation(format!(
                "duplicate model: {}",
                r.model
            )));
        }
    }
    tracing::debug!(count = resources.len(), "resource registry resolved");
    Ok(ResourceRegistry::new(resources, by_model))
}

pub fn load_registry_from_str(json: &str) -> Result<ResourceRegistry, ConfigError> {
    let resources = match serde_json::from_str::<RegistryFile>(json)? {
        RegistryFile::Wrapped { resources } => resources,
        RegistryFile::Bare(resources) => resources,
    };
    resolve(resources)
}

pub fn load_registry_from_path(path: impl AsRef<Path>) -> Result<ResourceRegistry, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_registry_from_str(&raw)
}
