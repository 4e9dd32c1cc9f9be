//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: one unit of fallible, value-producing
//! work with an optional timeout, completed either asynchronously
//! ([`Task::complete`]) or on the calling thread ([`Task::block`]).
//!
//! The operation receives a [`CancellationToken`] and should check it to stop
//! cooperatively; returning [`TaskError::Canceled`] marks the run as interrupted.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::exec::Facilities;
use crate::registry::TaskKind;
use crate::tasks::completion::Completion;
use crate::tasks::outcome::Outcome;

/// Zero-argument fallible operation producing an `R`.
pub type Operation<R> = Arc<dyn Fn(&CancellationToken) -> Result<R, TaskError> + Send + Sync>;

/// Consumer of an asynchronous outcome; called at most once.
pub type Callback<R> = Box<dyn FnOnce(Outcome<R>) + Send>;

/// Shared handle to a task.
pub type TaskRef<R> = Arc<dyn Task<R>>;

/// Everything a construction strategy needs to build a task.
pub struct TaskParams<R> {
    /// Kind the task was built for.
    pub kind: TaskKind,
    /// The operation to run.
    pub operation: Operation<R>,
    /// Timeout of the asynchronous path (`None` = no timeout).
    pub timeout: Option<Duration>,
    /// Pool, delayer and bus the task runs on.
    pub facilities: Facilities,
}

/// # Single-shot unit of work.
///
/// Every `complete`/`block` call runs the operation again and produces an
/// independent outcome; [`done`](Task::done) flips to `true` the first time any
/// of them concludes and stays there.
///
/// # Example
/// ```
/// use taskloom::{Facilities, Config, TaskKind, TaskRegistry};
///
/// let registry = TaskRegistry::new(Facilities::new(Config::default()).unwrap());
/// let task = registry
///     .task_builder::<u32>(TaskKind::BASIC)
///     .unwrap()
///     .operation(|_ctx| Ok(21 * 2))
///     .build()
///     .unwrap();
///
/// assert_eq!(task.block_ignoring_result(), Some(42));
/// assert!(task.done());
/// ```
pub trait Task<R: Send + 'static>: Send + Sync + 'static {
    /// Stable identifier of this task instance.
    fn id(&self) -> u64;

    /// Runs the operation on the shared pool without blocking the caller.
    ///
    /// If a timeout is configured, it races the operation; exactly one of them
    /// delivers to `callback`. An interrupted operation delivers nothing.
    fn complete(&self, callback: Option<Callback<R>>) -> Completion;

    /// Runs the operation on the calling thread.
    ///
    /// The configured timeout does **not** apply here.
    fn block(&self) -> Outcome<R>;

    /// Returns `true` once any execution of this task concluded.
    fn done(&self) -> bool;

    /// Cancels every in-flight and future execution of this task.
    fn cancel(&self);

    /// [`block`](Task::block), re-raising a carried fault.
    fn block_or_throw(&self) -> Result<Outcome<R>, TaskError> {
        self.block().throw_if_error()
    }

    /// [`block`](Task::block), keeping only the value.
    fn block_ignoring_result(&self) -> Option<R> {
        self.block().into_value()
    }

    /// [`block_or_throw`](Task::block_or_throw), keeping only the value.
    fn block_ignoring_result_or_throw(&self) -> Result<Option<R>, TaskError> {
        Ok(self.block_or_throw()?.into_value())
    }
}

impl<R: Send + 'static> dyn Task<R> {
    /// [`complete`](Task::complete) with a closure callback.
    pub fn on_complete<F>(&self, f: F) -> Completion
    where
        F: FnOnce(Outcome<R>) + Send + 'static,
    {
        self.complete(Some(Box::new(f)))
    }

    /// [`complete`](Task::complete) discarding the outcome.
    pub fn detach(&self) -> Completion {
        self.complete(None)
    }
}
