pub mod registry;
pub mod scaler;
pub mod smartcore_trainer;

pub use registry::TrainerRegistry;
pub use smartcore_trainer::{LinearClassifierTrainer, RandomForestTrainer};
