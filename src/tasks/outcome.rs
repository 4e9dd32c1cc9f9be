//! # Outcome of one task execution.
//!
//! [`Outcome`] is the immutable record produced by [`Task::block`](crate::Task::block)
//! and delivered to [`Task::complete`](crate::Task::complete) callbacks:
//!
//! | Variant       | value | elapsed | error                  | delivered by `complete`? |
//! |---------------|-------|---------|------------------------|--------------------------|
//! | `Completed`   | yes   | yes     | -                      | yes                      |
//! | `Failed`      | -     | -       | fault or `Timeout`     | yes                      |
//! | `Cancelled`   | -     | -       | -                      | never (silent)           |

use std::time::Duration;

use crate::error::TaskError;

/// Tri-state result of running a task's operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V> {
    /// The operation returned a value.
    Completed {
        /// Value returned by the operation.
        value: V,
        /// Wall-clock time the operation took.
        elapsed: Duration,
    },
    /// The operation raised a fault, or the timeout fired first.
    Failed(TaskError),
    /// The operation was interrupted before producing anything.
    Cancelled,
}

impl<V> Outcome<V> {
    /// Returns the value, if the operation completed.
    pub fn value(&self) -> Option<&V> {
        match self {
            Outcome::Completed { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Consumes the outcome and returns the value, if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            Outcome::Completed { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the measured execution time, if the operation completed.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Outcome::Completed { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }

    /// Returns the carried error, if any.
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the operation completed with a value.
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    /// Returns `true` if the outcome is the timeout fault.
    pub fn is_timeout(&self) -> bool {
        self.error().is_some_and(TaskError::is_timeout)
    }

    /// Returns `true` if the operation was interrupted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Returns `true` if the operation completed within `timeframe`.
    ///
    /// Failed and cancelled outcomes never completed, so they return `false`.
    pub fn completed_within(&self, timeframe: Duration) -> bool {
        self.elapsed().is_some_and(|elapsed| elapsed <= timeframe)
    }

    /// Re-raises the carried error; otherwise returns the outcome unchanged.
    pub fn throw_if_error(self) -> Result<Self, TaskError> {
        match self {
            Outcome::Failed(err) => Err(err),
            other => Ok(other),
        }
    }

    /// Transforms the value, keeping elapsed time and failures as they are.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed { value, elapsed } => Outcome::Completed {
                value: f(value),
                elapsed,
            },
            Outcome::Failed(err) => Outcome::Failed(err),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}
