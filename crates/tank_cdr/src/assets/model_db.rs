//! Per-model string attribute database

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Read-only `model -> key -> value` lookup
pub trait AttributeSource {
    /// Look up `key` on `model`
    fn query(&self, model: &str, key: &str) -> Option<&str>;
}

/// In-memory attribute database, loadable from `.ron` or `.toml`
///
/// ```ron
/// (models: {
///     "PzIVH": { "ARTHCK_GLACIS": "80", "ARTYPE_GLACIS": "RHA" },
/// })
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDatabase {
    /// Attributes per model name
    pub models: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config for ModelDatabase {}

impl ModelDatabase {
    /// Empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value
    pub fn insert(&mut self, model: impl Into<String>, key: impl Into<String>, value: impl Into<String>) {
        self.models
            .entry(model.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Builder-style [`ModelDatabase::insert`]
    pub fn with(mut self, model: &str, key: &str, value: impl Into<String>) -> Self {
        self.insert(model, key, value);
        self
    }

    /// Number of models with at least one attribute
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

impl AttributeSource for ModelDatabase {
    fn query(&self, model: &str, key: &str) -> Option<&str> {
        self.models.get(model)?.get(key).map(String::as_str)
    }
}
