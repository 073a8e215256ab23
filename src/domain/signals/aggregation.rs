//! Aggregation of point-wise model scores into trade signals.

/// Optional smoothing applied after averaging/thresholding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// Trailing mean over `window` rows, needs `window / 2` present values
    Rolling(usize),
    /// Exponential mean with the given span (`alpha = 2 / (span + 1)`), no bias adjustment
    Exponential(f64),
}

/// Averages score columns row by row, then optionally thresholds and smooths.
///
/// Missing values count as zero in the average. With a threshold the result is
/// `1.0` where the average reaches it and `0.0` elsewhere.
pub fn aggregate_score(
    columns: &[&[f64]],
    point_threshold: Option<f64>,
    smoothing: Option<Smoothing>,
) -> Vec<f64> {
    let rows = columns.iter().map(|c| c.len()).min().unwrap_or(0);
    let width = columns.len() as f64;

    let mut score: Vec<f64> = (0..rows)
        .map(|row| {
            columns
                .iter()
                .map(|c| c[row])
                .filter(|v| !v.is_nan())
                .sum::<f64>()
                / width
        })
        .collect();

    if let Some(threshold) = point_threshold {
        for value in score.iter_mut() {
            *value = if *value >= threshold { 1.0 } else { 0.0 };
        }
    }

    match smoothing {
        Some(Smoothing::Rolling(window)) => rolling_mean(&score, window),
        Some(Smoothing::Exponential(span)) => exponential_mean(&score, span),
        None => score,
    }
}

/// `(buy / (buy + sell)) * 2 - 1`, in `[-1, 1]` for non-negative scores.
///
/// Equal buy and sell strength gives `0` however strong both are.
pub fn combined_relative_score(buy: &[f64], sell: &[f64]) -> Vec<f64> {
    buy.iter()
        .zip(sell)
        .map(|(b, s)| (b / (b + s)) * 2.0 - 1.0)
        .collect()
}

/// Boolean signal where the score reaches `threshold`.
pub fn threshold_signal(score: &[f64], threshold: f64) -> Vec<bool> {
    score.iter().map(|v| *v >= threshold).collect()
}

fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let min_periods = (window / 2).max(1);

    (0..values.len())
        .map(|row| {
            let start = (row + 1).saturating_sub(window);
            let (sum, count) = values[start..=row]
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if count >= min_periods {
                sum / count as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

fn exponential_mean(values: &[f64], span: f64) -> Vec<f64> {
    let alpha = 2.0 / (span + 1.0);
    let min_periods = ((span / 2.0).floor() as usize).max(1);

    let mut state: Option<f64> = None;
    let mut observed = 0usize;
    values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                observed += 1;
                state = Some(match state {
                    Some(prev) => (1.0 - alpha) * prev + alpha * v,
                    None => v,
                });
            }
            match state {
                Some(s) if observed >= min_periods => s,
                _ => f64::NAN,
            }
        })
        .collect()
}
