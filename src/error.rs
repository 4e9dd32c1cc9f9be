//! Error types used by tasks, timers and the registry.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`] - faults of a task's operation (or its timeout), delivered
//!   through [`Outcome`](crate::Outcome) rather than raised.
//! - [`RuntimeError`] - misuse of the API (bad timer configuration, missing
//!   operation, unknown task implementation), raised immediately.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.

use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a task's operation.
///
/// These never escape [`Task::complete`](crate::Task::complete) or
/// [`Task::block`](crate::Task::block); they are carried inside an
/// [`Outcome`](crate::Outcome). Only the `*_or_throw` family re-raises them.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The configured timeout elapsed before the operation finished.
    #[error("task has timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The operation raised a fault.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The operation panicked.
    #[error("operation panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The operation observed cancellation and gave up.
    ///
    /// Operations return this to signal cooperative interruption; it is turned
    /// into [`Outcome::Cancelled`](crate::Outcome::Cancelled) and never delivered
    /// as a fault.
    #[error("operation cancelled")]
    Canceled,
}

impl TaskError {
    /// Wraps any displayable fault into [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskloom::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.to_string(), "execution failed: boom");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use taskloom::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Canceled => "operation cancelled".to_string(),
        }
    }

    /// Returns `true` for [`TaskError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::fail(err)
    }
}

/// # Errors produced by misuse of the runtime.
///
/// Configuration and lookup faults are programmer errors: they are returned
/// right away from the call that triggers them (`start`, `build`,
/// `task_builder`) and never travel through an [`Outcome`](crate::Outcome).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A periodic timer was started with a zero interval.
    #[error("interval must be greater than zero")]
    InvalidInterval,

    /// A task was built without an operation.
    #[error("task operation is missing and cannot be built")]
    MissingOperation,

    /// No construction strategy is registered for the given task kind.
    #[error("no task implementation registered for {kind:?}")]
    UnknownTaskImpl {
        /// The requested task kind.
        kind: String,
    },

    /// One of the shared execution facilities could not be created.
    #[error("failed to initialise {facility}: {source}")]
    FacilityInit {
        /// Which facility failed (`pool` or `delayer`).
        facility: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A task fault re-raised on the calling thread.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use taskloom::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::InvalidInterval.as_label(), "runtime_invalid_interval");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidInterval => "runtime_invalid_interval",
            RuntimeError::MissingOperation => "runtime_missing_operation",
            RuntimeError::UnknownTaskImpl { .. } => "runtime_unknown_task_impl",
            RuntimeError::FacilityInit { .. } => "runtime_facility_init",
            RuntimeError::Task(err) => err.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidInterval => "periodic interval must be > 0".to_string(),
            RuntimeError::MissingOperation => "operation missing".to_string(),
            RuntimeError::UnknownTaskImpl { kind } => format!("unknown task kind={kind}"),
            RuntimeError::FacilityInit { facility, source } => {
                format!("facility={facility} error={source}")
            }
            RuntimeError::Task(err) => err.as_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_wraps_message() {
        let err = TaskError::fail("boom");
        assert_eq!(err, TaskError::Fail { error: "boom".into() });
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.as_message(), "error: boom");
    }

    #[test]
    fn test_timeout_label() {
        let err = TaskError::Timeout {
            timeout: Duration::from_millis(10),
        };
        assert!(err.is_timeout());
        assert_eq!(err.as_label(), "task_timeout");
        assert!(!TaskError::Canceled.is_timeout());
    }

    #[test]
    fn test_runtime_error_forwards_task_label() {
        let err: RuntimeError = TaskError::fail("boom").into();
        assert_eq!(err.as_label(), "task_failed");
        assert!(err.to_string().contains("boom"));
    }
}
