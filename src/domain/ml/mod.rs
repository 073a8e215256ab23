pub mod feature_registry;
pub mod model;

pub use feature_registry::{FeatureSet, PredictionTask};
pub use model::ModelConfig;
