use super::scaler::StandardScaler;
use crate::domain::errors::TrainingError;
use crate::domain::ml::ModelConfig;
use crate::domain::ml::feature_registry::is_complete_row;
use crate::domain::ports::TrainerAdapter;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use tracing::debug;

/// Random forest regressor fitted on 0/1 labels; the mean tree vote is the score.
pub struct RandomForestTrainer;

/// Logistic regression; predicts the class as `0.0` or `1.0`.
pub struct LinearClassifierTrainer;

impl TrainerAdapter for RandomForestTrainer {
    fn train_predict(
        &self,
        x_train: &[Vec<f64>],
        y_train: &[f64],
        x_test: &[Vec<f64>],
        config: &ModelConfig,
    ) -> Result<Vec<f64>, TrainingError> {
        let (x_train, y_train, x_test) = prepare(x_train, y_train, x_test, config);
        let x_matrix = matrix(&x_train, self.name())?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(config.param_or("n_trees", 100.0) as usize)
            .with_max_depth(config.param_or("max_depth", 10.0) as u16)
            .with_min_samples_split(config.param_or("min_split", 5.0) as usize);

        debug!(
            "Fitting random forest on {} rows x {} features",
            x_train.len(),
            x_train.first().map_or(0, |r| r.len())
        );
        let model = RandomForestRegressor::fit(&x_matrix, &y_train, params)
            .map_err(|e| failed(self.name(), format!("Training error: {}", e)))?;

        predict_complete_rows(&x_test, |rows| {
            let m = matrix(rows, self.name())?;
            let pred: Vec<f64> = model
                .predict(&m)
                .map_err(|e| failed(self.name(), format!("Predict error: {}", e)))?;
            Ok(pred.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
        })
    }

    fn name(&self) -> &str {
        "rf"
    }
}

impl TrainerAdapter for LinearClassifierTrainer {
    fn train_predict(
        &self,
        x_train: &[Vec<f64>],
        y_train: &[f64],
        x_test: &[Vec<f64>],
        config: &ModelConfig,
    ) -> Result<Vec<f64>, TrainingError> {
        let (x_train, y_train, x_test) = prepare(x_train, y_train, x_test, config);
        let x_matrix = matrix(&x_train, self.name())?;
        let y: Vec<i32> = y_train.iter().map(|v| i32::from(*v != 0.0)).collect();

        let params = LogisticRegressionParameters::default().with_alpha(config.param_or("alpha", 0.0));
        let model = LogisticRegression::<f64, i32, DenseMatrix<f64>, Vec<i32>>::fit(&x_matrix, &y, params)
            .map_err(|e| failed(self.name(), format!("Training error: {}", e)))?;

        predict_complete_rows(&x_test, |rows| {
            let m = matrix(rows, self.name())?;
            let pred = model
                .predict(&m)
                .map_err(|e| failed(self.name(), format!("Predict error: {}", e)))?;
            Ok(pred.into_iter().map(f64::from).collect())
        })
    }

    fn name(&self) -> &str {
        "lc"
    }
}

/// Drops training rows without a label, then scales when configured.
fn prepare(
    x_train: &[Vec<f64>],
    y_train: &[f64],
    x_test: &[Vec<f64>],
    config: &ModelConfig,
) -> (Vec<Vec<f64>>, Vec<f64>, Vec<Vec<f64>>) {
    let (x_train, y_train): (Vec<Vec<f64>>, Vec<f64>) = x_train
        .iter()
        .zip(y_train)
        .filter(|(_, y)| !y.is_nan())
        .map(|(row, y)| (row.clone(), *y))
        .unzip();

    if config.is_scale {
        let scaler = StandardScaler::fit(&x_train);
        let x_test = scaler.transform(x_test);
        (scaler.transform(&x_train), y_train, x_test)
    } else {
        (x_train, y_train, x_test.to_vec())
    }
}

/// Predicts rows without missing features; the others get `NaN`.
fn predict_complete_rows<F>(x_test: &[Vec<f64>], predict: F) -> Result<Vec<f64>, TrainingError>
where
    F: FnOnce(&Vec<Vec<f64>>) -> Result<Vec<f64>, TrainingError>,
{
    let complete: Vec<usize> = (0..x_test.len())
        .filter(|i| is_complete_row(&x_test[*i]))
        .collect();

    let mut out = vec![f64::NAN; x_test.len()];
    if complete.is_empty() {
        return Ok(out);
    }

    let rows: Vec<Vec<f64>> = complete.iter().map(|i| x_test[*i].clone()).collect();
    let predicted = predict(&rows)?;
    for (idx, value) in complete.into_iter().zip(predicted) {
        out[idx] = value;
    }
    Ok(out)
}

fn matrix(rows: &Vec<Vec<f64>>, algo: &str) -> Result<DenseMatrix<f64>, TrainingError> {
    if rows.is_empty() {
        return Err(failed(algo, "Matrix error: no rows".to_string()));
    }
    DenseMatrix::from_2d_vec(rows).map_err(|e| failed(algo, format!("Matrix error: {}", e)))
}

fn failed(algo: &str, reason: String) -> TrainingError {
    TrainingError::Failed {
        column: algo.to_string(),
        reason,
    }
}
