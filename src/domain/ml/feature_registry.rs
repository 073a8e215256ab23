use serde::Serialize;

/// A named group of feature columns trained together, e.g. `kline` tagged `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    pub name: String,
    /// Short tag embedded in prediction column names
    pub tag: String,
    pub columns: Vec<String>,
    /// Maximum history rows used for training
    pub train_length: usize,
}

/// One trained model's output within a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionTask {
    pub label: String,
    pub algorithm: String,
    pub feature_set_tag: String,
}

impl PredictionTask {
    pub fn new(
        label: impl Into<String>,
        feature_set_tag: impl Into<String>,
        algorithm: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            algorithm: algorithm.into(),
            feature_set_tag: feature_set_tag.into(),
        }
    }

    /// `<label>_<tag>_<algorithm>`
    pub fn column_name(&self) -> String {
        format!("{}_{}_{}", self.label, self.feature_set_tag, self.algorithm)
    }
}

/// Tasks for one feature set in dispatch order: labels outer, algorithms inner.
pub fn prediction_tasks<L, A>(feature_set: &FeatureSet, labels: &[L], algorithms: &[A]) -> Vec<PredictionTask>
where
    L: AsRef<str>,
    A: AsRef<str>,
{
    labels
        .iter()
        .flat_map(|label| {
            algorithms.iter().map(move |algo| {
                PredictionTask::new(label.as_ref(), feature_set.tag.as_str(), algo.as_ref())
            })
        })
        .collect()
}

/// True when every value of the row is present and finite.
pub fn is_complete_row(row: &[f64]) -> bool {
    row.iter().all(|v| v.is_finite())
}
