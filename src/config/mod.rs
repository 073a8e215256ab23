//! Configuration of a rolling evaluation run.
//!
//! Loaded once from TOML and passed by value into the orchestrator; nothing
//! reads global parameters after that.

use crate::domain::errors::ConfigurationError;
use crate::domain::ml::{FeatureSet, ModelConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Environment variable overriding `max_workers`
pub const MAX_WORKERS_ENV: &str = "ROLLPREDICT_MAX_WORKERS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSetConfig {
    pub tag: String,
    pub columns: Vec<String>,
    pub train_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingConfig {
    /// Label columns to train and predict
    pub labels: Vec<String>,
    /// Rows of look-ahead used to build labels; excluded before each window
    pub label_horizon: usize,
    /// Selected feature sets, by name
    pub feature_sets: Vec<String>,
    /// Selected models, by name
    pub algorithms: Vec<String>,
    #[serde(default)]
    pub prediction_start: Option<usize>,
    /// `YYYY-MM-DD HH:MM:SS`, resolved to the first row at or after it
    #[serde(default)]
    pub prediction_start_time: Option<String>,
    /// Rows predicted per window (stride)
    pub prediction_length: usize,
    /// Number of windows; absent or 0 runs to the end of the data
    #[serde(default)]
    pub prediction_count: Option<usize>,
    /// Worker pool size; absent uses one worker per CPU
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// Input columns copied to the output; absent copies all of them
    #[serde(default)]
    pub output_columns: Option<Vec<String>>,
    #[serde(default, rename = "feature_set")]
    pub feature_set_defs: BTreeMap<String, FeatureSetConfig>,
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

impl RollingConfig {
    /// Reads TOML from `path` and applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let mut config = Self::from_toml(&content).map_err(|e| match e {
            ConfigurationError::Unreadable { reason, .. } => ConfigurationError::Unreadable {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| ConfigurationError::Unreadable {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigurationError> {
        if let Ok(value) = env::var(MAX_WORKERS_ENV) {
            let workers = value
                .parse::<usize>()
                .map_err(|e| ConfigurationError::InvalidParameter {
                    name: MAX_WORKERS_ENV.to_string(),
                    reason: e.to_string(),
                })?;
            self.max_workers = Some(workers);
        }
        Ok(())
    }

    /// Checks names and basic values; data-dependent checks happen at run start.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.labels.is_empty() {
            return Err(invalid("labels", "at least one label is required"));
        }
        if self.prediction_length == 0 {
            return Err(invalid("prediction_length", "stride must be positive"));
        }
        if self.max_workers == Some(0) {
            return Err(invalid("max_workers", "must be positive"));
        }
        if self.prediction_start.is_none() && self.prediction_start_time.is_none() {
            return Err(invalid(
                "prediction_start",
                "set prediction_start or prediction_start_time",
            ));
        }
        self.resolved_feature_sets()?;
        self.resolved_models()?;
        Ok(())
    }

    /// Selected feature sets in configured order.
    pub fn resolved_feature_sets(&self) -> Result<Vec<FeatureSet>, ConfigurationError> {
        if self.feature_sets.is_empty() {
            return Err(invalid("feature_sets", "at least one feature set is required"));
        }
        self.feature_sets
            .iter()
            .map(|name| {
                let def = self
                    .feature_set_defs
                    .get(name)
                    .ok_or_else(|| ConfigurationError::UnknownFeatureSet(name.clone()))?;
                if def.columns.is_empty() {
                    return Err(invalid(name, "feature set has no columns"));
                }
                Ok(FeatureSet {
                    name: name.clone(),
                    tag: def.tag.clone(),
                    columns: def.columns.clone(),
                    train_length: def.train_length,
                })
            })
            .collect()
    }

    /// Selected models as `(name, config)` in configured order.
    pub fn resolved_models(&self) -> Result<Vec<(String, ModelConfig)>, ConfigurationError> {
        if self.algorithms.is_empty() {
            return Err(invalid("algorithms", "at least one algorithm is required"));
        }
        self.algorithms
            .iter()
            .map(|name| {
                self.models
                    .get(name)
                    .map(|m| (name.clone(), m.clone()))
                    .ok_or_else(|| ConfigurationError::UnknownAlgorithm(name.clone()))
            })
            .collect()
    }
}

fn invalid(name: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
