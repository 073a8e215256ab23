use super::smartcore_trainer::{LinearClassifierTrainer, RandomForestTrainer};
use crate::domain::errors::ConfigurationError;
use crate::domain::ports::TrainerAdapter;
use std::collections::HashMap;
use std::sync::Arc;

/// Trainer adapters keyed by algorithm kind (`ModelConfig::algo`).
#[derive(Clone, Default)]
pub struct TrainerRegistry {
    adapters: HashMap<String, Arc<dyn TrainerAdapter>>,
}

impl TrainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in smartcore trainers `rf` and `lc`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("rf", Arc::new(RandomForestTrainer));
        registry.register("lc", Arc::new(LinearClassifierTrainer));
        registry
    }

    /// Adds or replaces the adapter for `algo`.
    pub fn register(&mut self, algo: impl Into<String>, adapter: Arc<dyn TrainerAdapter>) {
        self.adapters.insert(algo.into(), adapter);
    }

    pub fn get(&self, algo: &str) -> Result<Arc<dyn TrainerAdapter>, ConfigurationError> {
        self.adapters
            .get(algo)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownAlgorithm(algo.to_string()))
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(|k| k.as_str())
    }
}
