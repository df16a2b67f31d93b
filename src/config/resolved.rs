//! Resolved registry: validated resource definitions indexed by model name.

use crate::config::CrudConfig;
use crate::error::ConfigError;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<CrudConfig>,
    by_model: HashMap<String, usize>,
}

impl ResourceRegistry {
    /// Only `loader::resolve` builds a registry, after checking models are unique.
    pub(crate) fn new(resources: Vec<CrudConfig>, by_model: HashMap<String, usize>) -> Self {
        Self { resources, by_model }
    }

    pub fn get(&self, model: &str) -> Option<&CrudConfig> {
        self.by_model.get(model).and_then(|&i| self.resources.get(i))
    }

    /// Like `get`, but a missing model is an error.
    pub fn require(&self, model: &str) -> Result<&CrudConfig, ConfigError> {
        self.get(model)
            .ok_or_else(|| ConfigError::UnknownModel(model.to_string()))
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.model.as_str())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
