//! Point-wise classification quality of probability-like predictions.

use serde::Serialize;

/// Probability cut used for the class-based metrics
pub const CLASS_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationScores {
    pub samples: usize,
    /// `NaN` when only one class is present
    pub auc: f64,
    /// `NaN` when there are no positives
    pub average_precision: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

pub struct Classification;

impl Classification {
    /// Scores all pairs where both values are present.
    ///
    /// A ground truth value is positive when non-zero; a prediction is a
    /// positive class when it is strictly above [`CLASS_THRESHOLD`].
    pub fn scores(y_true: &[f64], y_score: &[f64]) -> ClassificationScores {
        let (truth, score): (Vec<bool>, Vec<f64>) = y_true
            .iter()
            .zip(y_score)
            .filter(|(t, s)| !t.is_nan() && !s.is_nan())
            .map(|(t, s)| (*t != 0.0, *s))
            .unzip();

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (&t, &s) in truth.iter().zip(&score) {
            match (t, s > CLASS_THRESHOLD) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ClassificationScores {
            samples: truth.len(),
            auc: Self::roc_auc(&truth, &score),
            average_precision: Self::average_precision(&truth, &score),
            f1,
            precision,
            recall,
        }
    }

    /// Area under the ROC curve as the Mann-Whitney statistic, ties averaged.
    pub fn roc_auc(truth: &[bool], score: &[f64]) -> f64 {
        let positives = truth.iter().filter(|t| **t).count();
        let negatives = truth.len() - positives;
        if positives == 0 || negatives == 0 {
            return f64::NAN;
        }

        let mut order: Vec<usize> = (0..score.len()).collect();
        order.sort_by(|a, b| score[*a].total_cmp(&score[*b]));

        let mut positive_rank_sum = 0.0;
        let mut i = 0;
        while i < order.len() {
            let mut j = i;
            while j + 1 < order.len() && score[order[j + 1]] == score[order[i]] {
                j += 1;
            }
            // 1-based ranks i+1..=j+1 share their mean
            let mean_rank = (i + j + 2) as f64 / 2.0;
            positive_rank_sum += order[i..=j].iter().filter(|idx| truth[**idx]).count() as f64 * mean_rank;
            i = j + 1;
        }

        let p = positives as f64;
        (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
    }

    /// Sum over distinct thresholds of `(R_n - R_{n-1}) * P_n`.
    pub fn average_precision(truth: &[bool], score: &[f64]) -> f64 {
        let positives = truth.iter().filter(|t| **t).count();
        if positives == 0 {
            return f64::NAN;
        }

        let mut order: Vec<usize> = (0..score.len()).collect();
        order.sort_by(|a, b| score[*b].total_cmp(&score[*a]));

        let mut ap = 0.0;
        let mut tp = 0usize;
        let mut seen = 0usize;
        let mut last_recall = 0.0;
        let mut i = 0;
        while i < order.len() {
            let threshold = score[order[i]];
            while i < order.len() && score[order[i]] == threshold {
                if truth[order[i]] {
                    tp += 1;
                }
                seen += 1;
                i += 1;
            }
            let recall = tp as f64 / positives as f64;
            let precision = tp as f64 / seen as f64;
            ap += (recall - last_recall) * precision;
            last_recall = recall;
        }
        ap
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
