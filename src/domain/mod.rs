// Time series table
pub mod table;

// Window scheduling
pub mod evaluation;

// Feature sets, prediction tasks and model settings
pub mod ml;

// Signal quality evaluation
pub mod performance;

// Score aggregation into signals
pub mod signals;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
