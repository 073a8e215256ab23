//! Rolling (walk-forward) train-predict loop.
//!
//! Windows run strictly one after another; only the tasks inside a window run
//! in parallel. Predictions of every window are appended to preallocated
//! columns and scored once over the whole horizon at the end.

use super::dispatcher::{TrainerDispatcher, WindowPredictions};
use crate::application::ml::TrainerRegistry;
use crate::config::RollingConfig;
use crate::domain::errors::{ConfigurationError, EvaluationError};
use crate::domain::evaluation::{ScheduleParams, WindowDescriptor, WindowScheduler};
use crate::domain::ml::PredictionTask;
use crate::domain::ml::feature_registry::prediction_tasks;
use crate::domain::performance::{Classification, ClassificationScores};
use crate::domain::ports::TaskScheduler;
use crate::domain::table::{TimeSeriesTable, parse_timestamp};
use crate::infrastructure::scheduler::RayonTaskScheduler;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, warn};

/// Pooled quality of one prediction column against its label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnScore {
    pub column: String,
    pub label: String,
    #[serde(flatten)]
    pub scores: ClassificationScores,
}

#[derive(Debug, Clone)]
pub struct RollingOutcome {
    /// Output columns plus one column per prediction task, from prediction start on
    pub predictions: TimeSeriesTable,
    pub scores: Vec<ColumnScore>,
    pub windows: Vec<WindowDescriptor>,
}

pub struct RollingOrchestrator<S: TaskScheduler> {
    config: RollingConfig,
    registry: TrainerRegistry,
    scheduler: S,
}

impl RollingOrchestrator<RayonTaskScheduler> {
    /// Orchestrator backed by a rayon pool of `config.max_workers` threads.
    pub fn with_worker_pool(
        config: RollingConfig,
        registry: TrainerRegistry,
    ) -> Result<Self, ConfigurationError> {
        let scheduler = RayonTaskScheduler::new(config.max_workers)?;
        Ok(Self::new(config, registry, scheduler))
    }
}

impl<S: TaskScheduler> RollingOrchestrator<S> {
    pub fn new(config: RollingConfig, registry: TrainerRegistry, scheduler: S) -> Self {
        Self {
            config,
            registry,
            scheduler,
        }
    }

    pub fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Runs every window and scores the pooled predictions.
    ///
    /// All configuration and column checks happen before the first training.
    /// The first failing window aborts the run and nothing is returned.
    pub fn run(&self, table: &TimeSeriesTable) -> Result<RollingOutcome, EvaluationError> {
        let started = Instant::now();
        let config = &self.config;
        config.validate()?;

        let feature_sets = config.resolved_feature_sets()?;
        let models = config.resolved_models()?;
        for (_, model) in &models {
            self.registry.get(&model.algo)?;
        }

        table.require_columns(&config.labels)?;
        for feature_set in &feature_sets {
            table.require_columns(&feature_set.columns)?;
        }
        let output_columns = self.output_columns(table);
        table.require_columns(&output_columns)?;

        let prediction_start = self.resolve_prediction_start(table)?;
        let schedule = WindowScheduler::new(ScheduleParams {
            len: table.len(),
            prediction_start,
            stride: config.prediction_length,
            horizon: config.label_horizon,
            step_count: config.prediction_count,
        })?;
        let steps = schedule.step_count();

        let model_names: Vec<&str> = models.iter().map(|(name, _)| name.as_str()).collect();
        let tasks: Vec<PredictionTask> = feature_sets
            .iter()
            .flat_map(|fs| prediction_tasks(fs, &config.labels, &model_names))
            .collect();
        check_prediction_columns(&tasks, &output_columns)?;
        let mut accumulator = PredictionAccumulator::new(tasks, schedule.prediction_rows().len());

        info!(
            "Starting rolling predict loop with {} steps. Each step with {} rows (stride). Workers: {}",
            steps,
            schedule.stride(),
            self.scheduler.max_workers()
        );

        let dispatcher = TrainerDispatcher::new(&self.registry, &self.scheduler);
        let mut windows = Vec::with_capacity(steps * feature_sets.len());
        for step in 0..steps {
            info!("===>>> Start step {}/{}", step, steps);
            for feature_set in &feature_sets {
                let window = schedule.window(step, feature_set.train_length);
                let predictions =
                    dispatcher.dispatch(table, &window, feature_set, &config.labels, &models)?;
                accumulator.append(predictions);
                windows.push(window);
            }
            info!("End step {}/{}.", step, steps);
        }

        let mut predictions = table.slice_rows(schedule.prediction_rows(), Some(output_columns.as_slice()))?;
        let columns = accumulator.finish();
        for (task, values) in &columns {
            predictions.push_column(task.column_name(), values.clone())?;
        }

        info!(
            "Finished all {} prediction steps. Predicted rows: {} ({} steps x {} stride). Predicted columns: {}",
            steps,
            predictions.len(),
            steps,
            schedule.stride(),
            columns.len()
        );

        let scores = score_columns(&predictions, &columns)?;
        info!(
            "Finished rolling predictions in {} seconds.",
            started.elapsed().as_secs()
        );

        Ok(RollingOutcome {
            predictions,
            scores,
            windows,
        })
    }

    /// Configured output columns (all input columns by default) followed by any label not yet included.
    fn output_columns(&self, table: &TimeSeriesTable) -> Vec<String> {
        let mut columns: Vec<String> = match &self.config.output_columns {
            Some(columns) => columns.clone(),
            None => table.column_names().map(String::from).collect(),
        };
        for label in &self.config.labels {
            if !columns.contains(label) {
                columns.push(label.clone());
            }
        }
        columns
    }

    fn resolve_prediction_start(&self, table: &TimeSeriesTable) -> Result<usize, ConfigurationError> {
        if let Some(start) = self.config.prediction_start {
            return Ok(start);
        }
        let raw = self.config.prediction_start_time.as_deref().unwrap_or_default();
        let timestamp = parse_timestamp(raw).ok_or_else(|| ConfigurationError::InvalidParameter {
            name: "prediction_start_time".to_string(),
            reason: format!("unrecognised timestamp {:?}", raw),
        })?;
        let start = table
            .find_index(timestamp)
            .ok_or_else(|| ConfigurationError::PredictionStartNotFound(raw.to_string()))?;
        info!("Start index: {}", start);
        Ok(start)
    }
}

/// Every prediction column name must be new to the output table and unique.
fn check_prediction_columns(
    tasks: &[PredictionTask],
    output_columns: &[String],
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        let column = task.column_name();
        if output_columns.contains(&column) || !seen.insert(column.clone()) {
            return Err(ConfigurationError::DuplicatePredictionColumn(column));
        }
    }
    Ok(())
}

/// Prediction columns growing window by window into preallocated storage.
struct PredictionAccumulator {
    columns: Vec<(PredictionTask, Vec<f64>)>,
    index: HashMap<String, usize>,
}

impl PredictionAccumulator {
    fn new(tasks: Vec<PredictionTask>, rows: usize) -> Self {
        let index = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (task.column_name(), i))
            .collect();
        let columns = tasks
            .into_iter()
            .map(|task| (task, Vec::with_capacity(rows)))
            .collect();
        Self { columns, index }
    }

    fn append(&mut self, predictions: WindowPredictions) {
        for (task, values) in predictions.columns {
            if let Some(&i) = self.index.get(&task.column_name()) {
                self.columns[i].1.extend(values);
            }
        }
    }

    fn finish(self) -> Vec<(PredictionTask, Vec<f64>)> {
        self.columns
    }
}

fn score_columns(
    predictions: &TimeSeriesTable,
    columns: &[(PredictionTask, Vec<f64>)],
) -> Result<Vec<ColumnScore>, EvaluationError> {
    columns
        .iter()
        .map(|(task, values)| {
            let truth = predictions.column(&task.label)?;
            let scores = Classification::scores(truth, values);
            let column = task.column_name();
            info!("Using {} non-nan rows for scoring {}.", scores.samples, column);
            if scores.auc.is_nan() {
                warn!("AUC undefined for {}: label {} has a single class", column, task.label);
            }
            Ok(ColumnScore {
                column,
                label: task.label.clone(),
                scores,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::TrainingError;
    use crate::domain::ml::ModelConfig;
    use crate::domain::ports::TrainerAdapter;
    use crate::config::FeatureSetConfig;
    use crate::infrastructure::scheduler::SequentialTaskScheduler;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the first feature as the score.
    struct EchoTrainer;

    impl TrainerAdapter for EchoTrainer {
        fn train_predict(
            &self,
            _x_train: &[Vec<f64>],
            _y_train: &[f64],
            x_test: &[Vec<f64>],
            _config: &ModelConfig,
        ) -> Result<Vec<f64>, TrainingError> {
            Ok(x_test.iter().map(|r| r[0]).collect())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn config() -> RollingConfig {
        RollingConfig::from_toml(
            r#"
labels = ["up"]
label_horizon = 1
feature_sets = ["kline"]
algorithms = ["echo"]
prediction_start = 10
prediction_length = 5
prediction_count = 2

[feature_set.kline]
tag = "k"
columns = ["signal"]
train_length = 6

[models.echo]
algo = "echo"
"#,
        )
        .unwrap()
    }

    fn table() -> TimeSeriesTable {
        let n = 25;
        let up: Vec<f64> = (0..n).map(|i| if i % 5 < 2 { 1.0 } else { 0.0 }).collect();
        let signal: Vec<f64> = up.iter().map(|u| if *u > 0.0 { 0.8 } else { 0.2 }).collect();
        TimeSeriesTable::new((0..n as i64).map(|i| 1_000 + i * 60_000).collect())
            .and_then(|t| t.with_column("close", (0..n).map(|i| 100.0 + i as f64).collect()))
            .and_then(|t| t.with_column("signal", signal))
            .and_then(|t| t.with_column("up", up))
            .unwrap()
    }

    fn orchestrator(config: RollingConfig) -> RollingOrchestrator<SequentialTaskScheduler> {
        let mut registry = TrainerRegistry::new();
        registry.register("echo", Arc::new(EchoTrainer));
        RollingOrchestrator::new(config, registry, SequentialTaskScheduler)
    }

    #[test]
    fn test_run_covers_prediction_horizon() {
        let outcome = orchestrator(config()).run(&table()).unwrap();

        assert_eq!(outcome.predictions.len(), 10);
        assert_eq!(outcome.predictions.timestamps()[0], 1_000 + 10 * 60_000);
        let names: Vec<_> = outcome.predictions.column_names().collect();
        assert_eq!(names, vec!["close", "signal", "up", "up_k_echo"]);

        let windows: Vec<_> = outcome.windows.iter().map(|w| (w.train_start, w.train_end)).collect();
        assert_eq!(windows, vec![(2, 8), (7, 13)]);

        assert_eq!(outcome.scores.len(), 1);
        let score = &outcome.scores[0];
        assert_eq!(score.label, "up");
        assert_eq!(score.scores.samples, 10);
        assert!((score.scores.auc - 1.0).abs() < 1e-12);
        assert!((score.scores.f1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_columns_always_include_labels() {
        let mut config = config();
        config.output_columns = Some(vec!["close".to_string()]);
        let outcome = orchestrator(config).run(&table()).unwrap();

        let names: Vec<_> = outcome.predictions.column_names().collect();
        assert_eq!(names, vec!["close", "up", "up_k_echo"]);
    }

    #[test]
    fn test_prediction_start_from_timestamp() {
        let mut config = config();
        config.prediction_start = None;
        // 00:11:30 falls between rows 11 and 12
        config.prediction_start_time = Some("1970-01-01 00:11:30".to_string());
        config.prediction_count = None;
        let outcome = orchestrator(config).run(&table()).unwrap();

        assert_eq!(outcome.windows[0].predict_start, 12);
        assert_eq!(outcome.predictions.len(), 10);
    }

    #[test]
    fn test_configuration_errors_before_training() {
        let mut too_many = config();
        too_many.prediction_count = Some(4);
        let err = orchestrator(too_many).run(&table()).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Configuration(ConfigurationError::InsufficientData { .. })
        ));

        let mut unknown = config();
        unknown.models.insert("gb".to_string(), ModelConfig::new("gb"));
        unknown.algorithms = vec!["gb".to_string()];
        let err = orchestrator(unknown).run(&table()).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Configuration(ConfigurationError::UnknownAlgorithm(_))
        ));

        let mut missing = config();
        missing.labels = vec!["down".to_string()];
        let err = orchestrator(missing).run(&table()).unwrap_err();
        assert!(matches!(err, EvaluationError::DataAlignment(_)));
    }

    /// Echo trainer that counts its trainings.
    struct CountingEcho {
        calls: Arc<AtomicUsize>,
    }

    impl TrainerAdapter for CountingEcho {
        fn train_predict(
            &self,
            x_train: &[Vec<f64>],
            y_train: &[f64],
            x_test: &[Vec<f64>],
            config: &ModelConfig,
        ) -> Result<Vec<f64>, TrainingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            EchoTrainer.train_predict(x_train, y_train, x_test, config)
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn assert_rejected_before_training(config: RollingConfig, table: &TimeSeriesTable) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = TrainerRegistry::new();
        registry.register(
            "echo",
            Arc::new(CountingEcho {
                calls: calls.clone(),
            }),
        );

        let err = RollingOrchestrator::new(config, registry, SequentialTaskScheduler)
            .run(table)
            .unwrap_err();

        assert!(matches!(
            err,
            EvaluationError::Configuration(ConfigurationError::DuplicatePredictionColumn(ref c))
                if c == "up_k_echo"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_feature_sets_sharing_a_tag_are_rejected() {
        let mut config = config();
        config.feature_set_defs.insert(
            "kline_close".to_string(),
            FeatureSetConfig {
                tag: "k".to_string(),
                columns: vec!["close".to_string()],
                train_length: 6,
            },
        );
        config.feature_sets.push("kline_close".to_string());

        assert_rejected_before_training(config, &table());
    }

    #[test]
    fn test_repeated_algorithm_is_rejected() {
        let mut config = config();
        config.algorithms.push("echo".to_string());

        assert_rejected_before_training(config, &table());
    }

    #[test]
    fn test_prediction_column_clashing_with_input_is_rejected() {
        let table = table().with_column("up_k_echo", vec![0.0; 25]).unwrap();

        assert_rejected_before_training(config(), &table);
    }
}
