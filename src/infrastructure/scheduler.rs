use crate::domain::errors::{ConfigurationError, TrainingError};
use crate::domain::ports::TaskScheduler;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Runs tasks on a dedicated rayon pool of `max_workers` threads.
///
/// Every submitted task runs to completion before `run_all` returns, even
/// when an earlier one failed, so a window never ends with trainers still
/// holding its data.
pub struct RayonTaskScheduler {
    pool: ThreadPool,
}

impl RayonTaskScheduler {
    /// `None` sizes the pool to the number of CPUs.
    pub fn new(max_workers: Option<usize>) -> Result<Self, ConfigurationError> {
        if max_workers == Some(0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "max_workers".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_workers.unwrap_or(0))
            .thread_name(|i| format!("trainer-{}", i))
            .build()
            .map_err(|e| ConfigurationError::WorkerPool(e.to_string()))?;
        Ok(Self { pool })
    }
}

impl TaskScheduler for RayonTaskScheduler {
    fn run_all<T, F>(&self, tasks: Vec<F>) -> Result<Vec<T>, TrainingError>
    where
        T: Send,
        F: FnOnce() -> Result<T, TrainingError> + Send,
    {
        let results: Vec<Result<T, TrainingError>> = self
            .pool
            .install(|| tasks.into_par_iter().map(|task| task()).collect());
        results.into_iter().collect()
    }

    fn max_workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Runs tasks one after another on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialTaskScheduler;

impl TaskScheduler for SequentialTaskScheduler {
    fn run_all<T, F>(&self, tasks: Vec<F>) -> Result<Vec<T>, TrainingError>
    where
        T: Send,
        F: FnOnce() -> Result<T, TrainingError> + Send,
    {
        tasks.into_iter().map(|task| task()).collect()
    }

    fn max_workers(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn failing(column: &str) -> TrainingError {
        TrainingError::Failed {
            column: column.to_string(),
            reason: "boom".to_string(),
        }
    }

    #[test]
    fn test_results_keep_submission_order() {
        let scheduler = RayonTaskScheduler::new(Some(4)).unwrap();
        let tasks: Vec<_> = (0..32usize)
            .map(|i| {
                move || {
                    std::thread::sleep(std::time::Duration::from_millis((32 - i) as u64));
                    Ok(i * 10)
                }
            })
            .collect();

        let results = scheduler.run_all(tasks).unwrap();
        assert_eq!(results, (0..32).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(scheduler.max_workers(), 4);
    }

    #[test]
    fn test_first_submitted_error_wins_and_all_tasks_run() {
        let scheduler = RayonTaskScheduler::new(Some(3)).unwrap();
        let finished = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..6usize)
            .map(|i| {
                let finished = &finished;
                move || {
                    finished.fetch_add(1, Ordering::SeqCst);
                    match i {
                        2 => Err(failing("second")),
                        4 => Err(failing("fourth")),
                        _ => Ok(i),
                    }
                }
            })
            .collect();

        let err = scheduler.run_all(tasks).unwrap_err();
        assert!(matches!(err, TrainingError::Failed { ref column, .. } if column == "second"));
        assert_eq!(finished.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_sequential_scheduler() {
        let tasks: Vec<_> = (0..3usize).map(|i| move || Ok(i + 1)).collect();
        assert_eq!(SequentialTaskScheduler.run_all(tasks).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(RayonTaskScheduler::new(Some(0)).is_err());
    }
}
