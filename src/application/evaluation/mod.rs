// Walk-forward evaluation
pub mod dispatcher;
pub mod orchestrator;
pub mod reporting;

pub use dispatcher::{TrainerDispatcher, WindowPredictions};
pub use orchestrator::{ColumnScore, RollingOrchestrator, RollingOutcome};
pub use reporting::EvaluationReporter;
