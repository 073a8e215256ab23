//! Walk-forward window scheduling.
//!
//! Prediction windows are contiguous blocks of `stride` rows starting at
//! `prediction_start`. Each window trains on history that ends `horizon + 1`
//! rows before the block so labels looking ahead cannot leak into training.

use crate::domain::errors::ConfigurationError;
use serde::Serialize;
use std::ops::Range;

/// Row offsets of one train/predict iteration. Ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowDescriptor {
    pub step: usize,
    pub train_start: usize,
    pub train_end: usize,
    pub predict_start: usize,
    pub predict_end: usize,
}

impl WindowDescriptor {
    pub fn train_rows(&self) -> Range<usize> {
        self.train_start..self.train_end
    }

    pub fn predict_rows(&self) -> Range<usize> {
        self.predict_start..self.predict_end
    }

    pub fn train_len(&self) -> usize {
        self.train_end - self.train_start
    }

    pub fn predict_len(&self) -> usize {
        self.predict_end - self.predict_start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleParams {
    /// Dataset length
    pub len: usize,
    /// First predicted row
    pub prediction_start: usize,
    /// Rows predicted per window
    pub stride: usize,
    /// Label look-ahead excluded before each window
    pub horizon: usize,
    /// Number of windows; `None` uses every full window until the end
    pub step_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct WindowScheduler {
    prediction_start: usize,
    stride: usize,
    horizon: usize,
    step_count: usize,
}

impl WindowScheduler {
    /// Validates the schedule up front. A short tail is an error, never truncated.
    pub fn new(params: ScheduleParams) -> Result<Self, ConfigurationError> {
        let ScheduleParams {
            len,
            prediction_start,
            stride,
            horizon,
            step_count,
        } = params;

        if stride == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "prediction_length".to_string(),
                reason: "stride must be positive".to_string(),
            });
        }
        // train_end = predict_start - horizon - 1 must leave at least one row
        if prediction_start < horizon.saturating_add(2) {
            return Err(ConfigurationError::PredictionStartTooEarly {
                prediction_start,
                horizon,
            });
        }

        let available = len.saturating_sub(prediction_start);
        let step_count = match step_count.filter(|s| *s > 0) {
            Some(steps) => steps,
            None => available / stride,
        };
        if step_count == 0 {
            return Err(ConfigurationError::NoPredictionWindow {
                prediction_start,
                len,
                stride,
            });
        }

        let required = step_count.checked_mul(stride).ok_or_else(|| {
            ConfigurationError::InvalidParameter {
                name: "prediction_count".to_string(),
                reason: format!("{} steps x {} stride overflows", step_count, stride),
            }
        })?;
        if available < required {
            return Err(ConfigurationError::InsufficientData {
                available,
                required,
                steps: step_count,
                stride,
            });
        }

        Ok(Self {
            prediction_start,
            stride,
            horizon,
            step_count,
        })
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn prediction_start(&self) -> usize {
        self.prediction_start
    }

    /// Rows covered by all windows together.
    pub fn prediction_rows(&self) -> Range<usize> {
        self.prediction_start..self.prediction_start + self.step_count * self.stride
    }

    /// Window `step`, training on at most `train_length` rows.
    ///
    /// Early windows get a shorter history when `train_length` reaches past row 0.
    pub fn window(&self, step: usize, train_length: usize) -> WindowDescriptor {
        let predict_start = self.prediction_start + step * self.stride;
        let train_end = predict_start - self.horizon - 1;
        WindowDescriptor {
            step,
            train_start: train_end.saturating_sub(train_length),
            train_end,
            predict_start,
            predict_end: predict_start + self.stride,
        }
    }

    /// Lazily yields every window in order.
    pub fn windows(&self, train_length: usize) -> impl Iterator<Item = WindowDescriptor> + '_ {
        (0..self.step_count).map(move |step| self.window(step, train_length))
    }
}
