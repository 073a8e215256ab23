use crate::domain::errors::TrainingError;
use crate::domain::ml::ModelConfig;

/// Train-and-predict contract implemented once per algorithm.
///
/// `x_train` rows are complete; `x_test` rows may contain `NaN` and the
/// returned vector must have exactly one prediction per `x_test` row.
pub trait TrainerAdapter: Send + Sync {
    fn train_predict(
        &self,
        x_train: &[Vec<f64>],
        y_train: &[f64],
        x_test: &[Vec<f64>],
        config: &ModelConfig,
    ) -> Result<Vec<f64>, TrainingError>;

    fn name(&self) -> &str;
}

/// Runs a batch of independent tasks and waits for all of them.
///
/// Results come back in submission order. When several tasks fail, the error
/// of the earliest submitted one is returned.
pub trait TaskScheduler: Send + Sync {
    fn run_all<T, F>(&self, tasks: Vec<F>) -> Result<Vec<T>, TrainingError>
    where
        T: Send,
        F: FnOnce() -> Result<T, TrainingError> + Send;

    /// Upper bound on concurrently running tasks.
    fn max_workers(&self) -> usize;
}
