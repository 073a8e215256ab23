use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hyper-parameters handed to a trainer adapter.
///
/// `algo` selects the adapter; `params` is adapter specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub algo: String,
    /// Standardise features with statistics of the training slice
    #[serde(default)]
    pub is_scale: bool,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ModelConfig {
    pub fn new(algo: impl Into<String>) -> Self {
        Self {
            algo: algo.into(),
            is_scale: false,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn with_scaling(mut self, is_scale: bool) -> Self {
        self.is_scale = is_scale;
        self
    }

    pub fn param_or(&self, name: &str, default: f64) -> f64 {
        self.params.get(name).copied().unwrap_or(default)
    }
}
