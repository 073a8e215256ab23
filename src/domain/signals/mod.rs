pub mod aggregation;

pub use aggregation::{Smoothing, aggregate_score, combined_relative_score, threshold_signal};
