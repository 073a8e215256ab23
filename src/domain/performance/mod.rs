// Signal quality evaluation
pub mod classification;
pub mod interval_score;
pub mod trade_simulator;

pub use classification::{Classification, ClassificationScores};
pub use interval_score::{IntervalConfusion, IntervalScore, find_interval_scores};
pub use trade_simulator::{Mode, TradeEvent, TradePerformance, TradeSimulator};
