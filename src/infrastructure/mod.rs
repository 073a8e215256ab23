pub mod csv_table;
pub mod scheduler;

pub use csv_table::{read_table, write_table};
pub use scheduler::{RayonTaskScheduler, SequentialTaskScheduler};
