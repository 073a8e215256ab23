// Rolling train-predict loop and reporting
pub mod evaluation;

// Trainer adapters and registry
pub mod ml;
