//! Interval-level scoring of point-wise predictions.
//!
//! A boolean label column is split into maximal runs of equal values. Each run
//! is scored as a hit when at least one of its points reaches the threshold, so
//! a true interval needs one alarm and a false interval is spoiled by one.

use crate::domain::errors::DataAlignmentError;
use crate::domain::table::TimeSeriesTable;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalScore {
    pub interval_id: usize,
    pub interval_label: bool,
    /// At least one point of the interval has `score >= threshold`
    pub interval_score: bool,
    pub start: usize,
    /// Exclusive
    pub end: usize,
}

impl IntervalScore {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Splits `labels` into intervals and scores each one against `threshold`.
///
/// Missing scores (`NaN`) never cross the threshold.
pub fn find_interval_scores(
    labels: &[bool],
    scores: &[f64],
    threshold: f64,
) -> Result<Vec<IntervalScore>, DataAlignmentError> {
    if scores.len() != labels.len() {
        return Err(DataAlignmentError::ColumnLength {
            column: "score".to_string(),
            expected: labels.len(),
            actual: scores.len(),
        });
    }

    let mut intervals: Vec<IntervalScore> = Vec::new();

    for (row, (&label, &score)) in labels.iter().zip(scores).enumerate() {
        let hit = score >= threshold;
        match intervals.last_mut() {
            Some(current) if current.interval_label == label => {
                current.interval_score |= hit;
                current.end = row + 1;
            }
            _ => intervals.push(IntervalScore {
                interval_id: intervals.len(),
                interval_label: label,
                interval_score: hit,
                start: row,
                end: row + 1,
            }),
        }
    }

    Ok(intervals)
}

/// Table variant of [`find_interval_scores`]. The table must be time ordered.
pub fn score_table_intervals(
    table: &TimeSeriesTable,
    label_column: &str,
    score_column: &str,
    threshold: f64,
) -> Result<Vec<IntervalScore>, DataAlignmentError> {
    let labels = table.bool_column(label_column)?;
    let scores = table.column(score_column)?;
    find_interval_scores(&labels, scores, threshold)
}

/// Interval-level confusion matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntervalConfusion {
    /// True interval with at least one alarm
    pub hit: usize,
    /// True interval without alarms
    pub missed: usize,
    /// False interval with at least one alarm
    pub false_alarm: usize,
    /// False interval without alarms
    pub quiet: usize,
}

impl IntervalConfusion {
    pub fn from_intervals(intervals: &[IntervalScore]) -> Self {
        intervals.iter().fold(Self::default(), |mut acc, interval| {
            match (interval.interval_label, interval.interval_score) {
                (true, true) => acc.hit += 1,
                (true, false) => acc.missed += 1,
                (false, true) => acc.false_alarm += 1,
                (false, false) => acc.quiet += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.hit + self.missed + self.false_alarm + self.quiet
    }

    pub fn precision(&self) -> f64 {
        ratio(self.hit, self.hit + self.false_alarm)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.hit, self.hit + self.missed)
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.hit + self.quiet, self.total())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_intervals_with_false_positive() {
        let labels = [true, true, false, false, false, true];
        let scores = [0.9, 0.1, 0.2, 0.8, 0.1, 0.95];

        let intervals = find_interval_scores(&labels, &scores, 0.5).unwrap();
        let summary: Vec<_> = intervals
            .iter()
            .map(|i| (i.interval_id, i.interval_label, i.interval_score))
            .collect();

        assert_eq!(summary, vec![(0, true, true), (1, false, true), (2, true, true)]);
        assert_eq!((intervals[1].start, intervals[1].end), (2, 5));
    }

    #[test]
    fn test_constant_label_is_one_interval() {
        let intervals = find_interval_scores(&[false; 4], &[0.1, 0.2, 0.3, 0.4], 0.5).unwrap();
        assert_eq!(intervals.len(), 1);
        assert!(!intervals[0].interval_score);
        assert_eq!(intervals[0].len(), 4);
    }

    #[test]
    fn test_threshold_is_inclusive_and_nan_is_not_a_hit() {
        let intervals = find_interval_scores(&[true, false], &[0.5, f64::NAN], 0.5).unwrap();
        assert!(intervals[0].interval_score);
        assert!(!intervals[1].interval_score);
    }

    #[test]
    fn test_empty_input() {
        assert!(find_interval_scores(&[], &[], 0.5).unwrap().is_empty());
    }

    #[test]
    fn test_rescoring_intervals_is_a_fixed_point() {
        let labels = [true, true, false, true, true, true, false, false];
        let scores = [0.1, 0.7, 0.9, 0.2, 0.3, 0.1, 0.0, 0.2];
        let first = find_interval_scores(&labels, &scores, 0.5).unwrap();

        let labels2: Vec<bool> = first.iter().map(|i| i.interval_label).collect();
        let scores2: Vec<f64> = first
            .iter()
            .map(|i| if i.interval_score { 1.0 } else { 0.0 })
            .collect();
        let second = find_interval_scores(&labels2, &scores2, 0.5).unwrap();

        assert_eq!(second.len(), first.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.interval_label, b.interval_label);
            assert_eq!(a.interval_score, b.interval_score);
            assert_eq!(b.len(), 1);
        }
    }

    #[test]
    fn test_confusion_matrix() {
        let labels = [true, true, false, false, true, false, true];
        let scores = [0.9, 0.1, 0.2, 0.8, 0.1, 0.0, 0.7];
        let intervals = find_interval_scores(&labels, &scores, 0.5).unwrap();
        let confusion = IntervalConfusion::from_intervals(&intervals);

        assert_eq!(
            confusion,
            IntervalConfusion {
                hit: 2,
                missed: 1,
                false_alarm: 1,
                quiet: 1,
            }
        );
        assert!((confusion.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((confusion.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((confusion.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_score_table_intervals() {
        let table = TimeSeriesTable::new(vec![1, 2, 3])
            .and_then(|t| t.with_column("top", vec![1.0, 0.0, 0.0]))
            .and_then(|t| t.with_column("top_k_rf", vec![0.2, 0.6, 0.1]))
            .unwrap();

        let intervals = score_table_intervals(&table, "top", "top_k_rf", 0.5).unwrap();
        assert_eq!(intervals.len(), 2);
        assert!(!intervals[0].interval_score);
        assert!(intervals[1].interval_score);

        assert!(score_table_intervals(&table, "bottom", "top_k_rf", 0.5).is_err());
    }

    #[test]
    fn test_misaligned_scores_are_rejected() {
        let err = find_interval_scores(&[true, false, true], &[0.9, 0.1], 0.5).unwrap_err();
        assert!(matches!(
            err,
            DataAlignmentError::ColumnLength { expected: 3, actual: 2, .. }
        ));
    }
}
