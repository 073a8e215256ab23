use thiserror::Error;

/// Errors raised while validating a run before any training starts
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(
        "Not enough data after prediction start: {available} rows available, {required} required ({steps} steps x {stride} stride)"
    )]
    InsufficientData {
        available: usize,
        required: usize,
        steps: usize,
        stride: usize,
    },

    #[error("No complete prediction window fits after row {prediction_start} (dataset length {len}, stride {stride})")]
    NoPredictionWindow {
        prediction_start: usize,
        len: usize,
        stride: usize,
    },

    #[error("Prediction start {prediction_start} leaves no training rows before the {horizon}-row embargo")]
    PredictionStartTooEarly { prediction_start: usize, horizon: usize },

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown feature set: {0}")]
    UnknownFeatureSet(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Prediction column {0} is produced twice or clashes with an output column")]
    DuplicatePredictionColumn(String),

    #[error("No row at or after prediction start time {0}")]
    PredictionStartNotFound(String),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Failed to read config file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Errors raised by a trainer adapter inside a dispatched task
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Training failed for {column}: {reason}")]
    Failed { column: String, reason: String },

    #[error("Trainer for {column} returned {actual} predictions, expected {expected}")]
    PredictionLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("No complete training rows for {column} in [{train_start}, {train_end})")]
    EmptyTrainingSet {
        column: String,
        train_start: usize,
        train_end: usize,
    },
}

/// Errors raised when the input table does not match what the run expects
#[derive(Debug, Error)]
pub enum DataAlignmentError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column {column} has {actual} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Timestamps are not strictly increasing at row {row}")]
    UnorderedTimestamps { row: usize },

    #[error("Invalid value {value:?} in column {column} at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },
}

/// Any failure of a rolling evaluation run
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    DataAlignment(#[from] DataAlignmentError),
}
