//! # Execution facility configuration.
//!
//! Provides [`Config`] centralized settings for the shared [`Facilities`](crate::Facilities):
//! the task pool, the single-threaded delayer, and the event bus.
//!
//! ## Sentinel values
//! - `workers = 0` → let tokio pick (one worker per core)
//! - `max_blocking_threads = 0` → tokio default cap
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;
use std::time::Duration;

/// Configuration for the shared execution facilities.
///
/// ## Field semantics
/// - `workers`: async worker threads of the task pool (`0` = tokio default)
/// - `max_blocking_threads`: upper bound of concurrently running operations (`0` = tokio default)
/// - `keep_alive`: how long an idle operation thread lingers before exiting
/// - `thread_name`: prefix used by the shared [`ThreadFactory`](crate::ThreadFactory)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of async worker threads driving the task pool.
    pub workers: usize,

    /// Maximum number of operations executing at the same time.
    ///
    /// Operations are blocking closures; each one occupies a pool thread for
    /// its whole duration.
    pub max_blocking_threads: usize,

    /// Idle lifetime of an operation thread.
    pub keep_alive: Duration,

    /// Name prefix for every thread created by the facilities.
    pub thread_name: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the worker count as an `Option` (`None` → tokio default).
    #[inline]
    pub fn worker_threads(&self) -> Option<usize> {
        if self.workers == 0 {
            None
        } else {
            Some(self.workers)
        }
    }

    /// Returns the blocking-thread cap as an `Option` (`None` → tokio default).
    #[inline]
    pub fn blocking_threads(&self) -> Option<usize> {
        if self.max_blocking_threads == 0 {
            None
        } else {
            Some(self.max_blocking_threads)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers = 0` (tokio default)
    /// - `max_blocking_threads = 0` (tokio default, effectively unbounded for this use)
    /// - `keep_alive = 10s`
    /// - `thread_name = "taskloom"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            workers: 0,
            max_blocking_threads: 0,
            keep_alive: Duration::from_secs(10),
            thread_name: Cow::Borrowed("taskloom"),
            bus_capacity: 1024,
        }
    }
}
