pub mod window;

pub use window::{ScheduleParams, WindowDescriptor, WindowScheduler};
