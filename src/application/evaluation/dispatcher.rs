use crate::application::ml::TrainerRegistry;
use crate::domain::errors::{EvaluationError, TrainingError};
use crate::domain::evaluation::WindowDescriptor;
use crate::domain::ml::feature_registry::{is_complete_row, prediction_tasks};
use crate::domain::ml::{FeatureSet, ModelConfig, PredictionTask};
use crate::domain::ports::TaskScheduler;
use crate::domain::table::TimeSeriesTable;
use tracing::{debug, info};

/// Predictions of one window for one feature set, in task order.
#[derive(Debug, Clone)]
pub struct WindowPredictions {
    pub window: WindowDescriptor,
    pub columns: Vec<(PredictionTask, Vec<f64>)>,
}

/// Fans one window out to one train-predict task per `(label, model)` pair.
///
/// Tasks only read the window's slices. The call returns after every task
/// finished and fails as a whole if any task failed.
pub struct TrainerDispatcher<'a, S: TaskScheduler> {
    registry: &'a TrainerRegistry,
    scheduler: &'a S,
}

impl<'a, S: TaskScheduler> TrainerDispatcher<'a, S> {
    pub fn new(registry: &'a TrainerRegistry, scheduler: &'a S) -> Self {
        Self {
            registry,
            scheduler,
        }
    }

    pub fn dispatch(
        &self,
        table: &TimeSeriesTable,
        window: &WindowDescriptor,
        feature_set: &FeatureSet,
        labels: &[String],
        models: &[(String, ModelConfig)],
    ) -> Result<WindowPredictions, EvaluationError> {
        table.require_columns(&feature_set.columns)?;
        table.require_columns(labels)?;

        info!(
            "Start training '{}' package with {} features, name tag '{}', and train length {}",
            feature_set.name,
            feature_set.columns.len(),
            feature_set.tag,
            feature_set.train_length
        );

        // Drop training rows with missing features; labels follow the kept rows
        let raw_train = table.feature_rows(&feature_set.columns, window.train_rows())?;
        let kept: Vec<usize> = raw_train
            .iter()
            .enumerate()
            .filter(|(_, row)| is_complete_row(row))
            .map(|(i, _)| window.train_start + i)
            .collect();
        let x_train: Vec<Vec<f64>> = raw_train.into_iter().filter(|row| is_complete_row(row)).collect();
        if x_train.is_empty() {
            return Err(TrainingError::EmptyTrainingSet {
                column: feature_set.name.clone(),
                train_start: window.train_start,
                train_end: window.train_end,
            }
            .into());
        }

        let y_by_label = labels
            .iter()
            .map(|label| {
                let values = table.column(label)?;
                Ok::<_, EvaluationError>(kept.iter().map(|row| values[*row]).collect::<Vec<f64>>())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let x_test = table.feature_rows(&feature_set.columns, window.predict_rows())?;
        let expected = x_test.len();

        info!(
            "Train range: [{}, {})={} ({} complete rows). Prediction range: [{}, {})={}.",
            window.train_start,
            window.train_end,
            window.train_len(),
            x_train.len(),
            window.predict_start,
            window.predict_end,
            window.predict_len()
        );

        let model_names: Vec<&str> = models.iter().map(|(name, _)| name.as_str()).collect();
        let tasks = prediction_tasks(feature_set, labels, &model_names);

        let mut jobs = Vec::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            let y_train = &y_by_label[i / models.len()];
            let (_, model) = &models[i % models.len()];
            let adapter = self.registry.get(&model.algo)?;
            let column = task.column_name();
            let x_train = &x_train;
            let x_test = &x_test;

            jobs.push(move || {
                debug!("Train-predict {} on {} rows", column, x_train.len());
                let predictions = adapter
                    .train_predict(x_train, y_train, x_test, model)
                    .map_err(|e| with_column(e, &column))?;
                if predictions.len() != expected {
                    return Err(TrainingError::PredictionLength {
                        column,
                        expected,
                        actual: predictions.len(),
                    });
                }
                Ok(predictions)
            });
        }

        let results = self.scheduler.run_all(jobs)?;

        Ok(WindowPredictions {
            window: *window,
            columns: tasks.into_iter().zip(results).collect(),
        })
    }
}

fn with_column(error: TrainingError, column: &str) -> TrainingError {
    match error {
        TrainingError::Failed { reason, .. } => TrainingError::Failed {
            column: column.to_string(),
            reason,
        },
        other => other,
    }
}
