//! Rolling Prediction Evaluator Binary
//!
//! Runs walk-forward train-predict loops over a CSV table and scores the
//! resulting signals point-wise, per interval and as simulated trades.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollpredict::application::evaluation::{EvaluationReporter, RollingOrchestrator};
use rollpredict::application::ml::TrainerRegistry;
use rollpredict::config::RollingConfig;
use rollpredict::domain::performance::interval_score::score_table_intervals;
use rollpredict::domain::performance::{IntervalConfusion, TradeSimulator};
use rollpredict::domain::signals::{Smoothing, aggregate_score, threshold_signal};
use rollpredict::domain::table::TimeSeriesTable;
use rollpredict::infrastructure::{read_table, write_table};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Walk-forward rolling prediction evaluator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and predict window by window, then score the predictions
    Rolling {
        /// TOML file with the rolling configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Input CSV with a `timestamp` column
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV for the predictions
        #[arg(short, long, default_value = "predictions.csv")]
        output: PathBuf,

        /// Text file the score lines are appended to
        #[arg(long, default_value = "prediction-metrics.txt")]
        metrics: PathBuf,

        /// Optional JSON score report
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Score a prediction column per label interval
    Intervals {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        label_column: String,

        /// Score columns, averaged when more than one is given
        #[arg(long, value_delimiter = ',', required = true)]
        score_columns: Vec<String>,

        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Optional JSON export of every interval
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Simulate alternating long/short trades from buy and sell scores
    Trades {
        #[arg(short, long)]
        input: PathBuf,

        /// Buy score columns, averaged when more than one is given
        #[arg(long, value_delimiter = ',', required = true)]
        buy_columns: Vec<String>,

        /// Sell score columns, averaged when more than one is given
        #[arg(long, value_delimiter = ',', required = true)]
        sell_columns: Vec<String>,

        #[arg(long, default_value = "close")]
        price_column: String,

        #[arg(long, default_value = "0.5")]
        buy_threshold: f64,

        #[arg(long, default_value = "0.5")]
        sell_threshold: f64,

        /// Rolling mean window applied to the aggregated scores
        #[arg(long)]
        smoothing_window: Option<usize>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rolling {
            config,
            input,
            output,
            metrics,
            json,
        } => {
            info!("Loading rolling configuration from: {}", config.display());
            let rolling_config = RollingConfig::load(&config)?;
            let table = read_table(&input)?;

            let orchestrator =
                RollingOrchestrator::with_worker_pool(rolling_config, TrainerRegistry::with_defaults())?;
            let outcome = orchestrator
                .run(&table)
                .context("Rolling predictions failed")?;

            write_table(&outcome.predictions, &output)?;
            EvaluationReporter::print_scores(&outcome.scores);
            EvaluationReporter::append_score_lines(&outcome.scores, &metrics)?;
            if let Some(path) = json {
                EvaluationReporter::export_json(
                    &outcome.scores,
                    &outcome.windows,
                    &config.display().to_string(),
                    &path,
                )?;
            }
            println!("✅ Rolling predictions complete!\n");
        }
        Commands::Intervals {
            input,
            label_column,
            score_columns,
            threshold,
            json,
        } => {
            let mut table = read_table(&input)?;
            let score_column = combined_column(&mut table, &score_columns, None)?;

            let intervals = score_table_intervals(&table, &label_column, &score_column, threshold)?;
            let confusion = IntervalConfusion::from_intervals(&intervals);
            EvaluationReporter::print_intervals(&confusion);

            if let Some(path) = json {
                let content = serde_json::to_string_pretty(&intervals)
                    .context("Failed to serialize interval scores")?;
                std::fs::write(&path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("💾 Intervals saved to: {}", path.display());
            }
        }
        Commands::Trades {
            input,
            buy_columns,
            sell_columns,
            price_column,
            buy_threshold,
            sell_threshold,
            smoothing_window,
        } => {
            let mut table = read_table(&input)?;
            let smoothing = smoothing_window.map(Smoothing::Rolling);
            let buy_column = combined_column(&mut table, &buy_columns, smoothing)?;
            let sell_column = combined_column(&mut table, &sell_columns, smoothing)?;

            let buy = threshold_signal(table.column(&buy_column)?, buy_threshold);
            let sell = threshold_signal(table.column(&sell_column)?, sell_threshold);
            let price = table.column(&price_column)?;

            let performance = TradeSimulator::run(&sell, &buy, price)?;
            EvaluationReporter::print_trades(&performance);
        }
    }

    Ok(())
}

/// Returns the single column unchanged, or adds their mean as a new column.
fn combined_column(
    table: &mut TimeSeriesTable,
    columns: &[String],
    smoothing: Option<Smoothing>,
) -> Result<String> {
    if columns.len() == 1 && smoothing.is_none() {
        return Ok(columns[0].clone());
    }

    let sources = columns
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<Vec<_>, _>>()?;
    let combined = aggregate_score(&sources, None, smoothing);

    let name = format!("{}_score", columns.join("_"));
    table.push_column(name.clone(), combined)?;
    Ok(name)
}
