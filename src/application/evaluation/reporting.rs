//! Reporting utilities for rolling prediction results.
//!
//! Provides formatted console output, plain-text score logs and JSON export.

use super::orchestrator::ColumnScore;
use crate::domain::evaluation::WindowDescriptor;
use crate::domain::performance::{IntervalConfusion, TradePerformance};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ScoreReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub configuration: String,
    pub windows: &'a [WindowDescriptor],
    pub scores: &'a [ColumnScore],
}

/// Reporter for rolling prediction scores.
pub struct EvaluationReporter;

impl EvaluationReporter {
    /// `column, auc, ap, f1, precision, recall` with three decimals.
    pub fn score_line(score: &ColumnScore) -> String {
        let s = &score.scores;
        format!(
            "{}, {:.3}, {:.3}, {:.3}, {:.3}, {:.3}",
            score.column, s.auc, s.average_precision, s.f1, s.precision, s.recall
        )
    }

    /// Appends one line per column to `path`, creating it when missing.
    pub fn append_score_lines(scores: &[ColumnScore], path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open score file: {}", path.display()))?;

        for score in scores {
            writeln!(file, "{}", Self::score_line(score))
                .with_context(|| format!("Failed to write score file: {}", path.display()))?;
        }

        info!("Appended {} score lines to {}", scores.len(), path.display());
        Ok(())
    }

    pub fn export_json(
        scores: &[ColumnScore],
        windows: &[WindowDescriptor],
        configuration: &str,
        path: &Path,
    ) -> Result<()> {
        ensure_parent(path)?;
        let report = ScoreReport {
            timestamp: Utc::now(),
            configuration: configuration.to_string(),
            windows,
            scores,
        };
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize score report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write score report to {}", path.display()))?;

        println!("💾 Score report saved to: {}", path.display());
        Ok(())
    }

    pub fn print_scores(scores: &[ColumnScore]) {
        println!("\n{}", "=".repeat(80));
        println!("✅ ROLLING PREDICTIONS SCORED - {} columns", scores.len());
        println!("{}", "=".repeat(80));
        println!(
            "{:<28} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7}",
            "Column", "Rows", "AUC", "AP", "F1", "Prec", "Recall"
        );
        println!("{}", "-".repeat(80));

        for score in scores {
            let s = &score.scores;
            println!(
                "{:<28} | {:>7} | {:>7.3} | {:>7.3} | {:>7.3} | {:>7.3} | {:>7.3}",
                score.column, s.samples, s.auc, s.average_precision, s.f1, s.precision, s.recall
            );
        }
        println!("{}\n", "=".repeat(80));
    }

    pub fn print_intervals(confusion: &IntervalConfusion) {
        println!("\n📊 Interval Scores ({} intervals):", confusion.total());
        println!("  Hit:            {}", confusion.hit);
        println!("  Missed:         {}", confusion.missed);
        println!("  False alarm:    {}", confusion.false_alarm);
        println!("  Quiet:          {}", confusion.quiet);
        println!("  Precision:      {:.3}", confusion.precision());
        println!("  Recall:         {:.3}", confusion.recall());
        println!("  Accuracy:       {:.3}", confusion.accuracy());
    }

    pub fn print_trades(performance: &TradePerformance) {
        println!("\n💰 Trade Simulation:");
        println!(
            "  Long:   {:>10.2} over {} trades ({:.1}% profitable)",
            performance.performance_long,
            performance.long_count,
            performance.long_profitable_pct()
        );
        println!(
            "  Short:  {:>10.2} over {} trades ({:.1}% profitable)",
            performance.performance_short,
            performance.short_count,
            performance.short_profitable_pct()
        );
        println!("  Total:  {:>10.2}", performance.total());
        println!("  Per trade: {:.4}", performance.profit_per_trade());
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::ClassificationScores;

    fn score(column: &str, auc: f64) -> ColumnScore {
        ColumnScore {
            column: column.to_string(),
            label: "high_10".to_string(),
            scores: ClassificationScores {
                samples: 100,
                auc,
                average_precision: 0.4567,
                f1: 0.5,
                precision: 0.25,
                recall: 1.0,
            },
        }
    }

    #[test]
    fn test_score_line_format() {
        assert_eq!(
            EvaluationReporter::score_line(&score("high_10_k_rf", 0.61234)),
            "high_10_k_rf, 0.612, 0.457, 0.500, 0.250, 1.000"
        );
    }

    #[test]
    fn test_score_lines_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.txt");

        EvaluationReporter::append_score_lines(&[score("a", 0.5)], &path).unwrap();
        EvaluationReporter::append_score_lines(&[score("b", 0.7), score("c", f64::NAN)], &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("b, 0.700"));
        assert!(lines[2].starts_with("c, NaN"));
    }

    #[test]
    fn test_json_export_flattens_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("scores.json");

        EvaluationReporter::export_json(&[score("a", 0.75)], &[], "test", &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["configuration"], "test");
        assert_eq!(value["scores"][0]["column"], "a");
        assert_eq!(value["scores"][0]["auc"], 0.75);
        assert_eq!(value["scores"][0]["samples"], 100);
    }
}
