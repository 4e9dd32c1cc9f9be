//! # Fluent construction of registry-backed tasks.
//!
//! A [`TaskBuilder`] is bound to one kind's construction strategy when the
//! registry hands it out. `build()` erases the typed operation, runs the
//! strategy, and wraps the result back into a typed [`TaskRef`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeError, TaskError};
use crate::exec::Facilities;
use crate::registry::{TaskFactory, TaskKind};
use crate::tasks::erased::{Typed, erase};
use crate::tasks::task::{Operation, TaskParams, TaskRef};

/// Builder for tasks of one registered kind, with a fluent API.
///
/// Obtained from [`TaskRegistry::task_builder`](crate::TaskRegistry::task_builder).
/// [`build`](Self::build) borrows the builder, so one builder can produce several
/// independent tasks.
pub struct TaskBuilder<R> {
    kind: TaskKind,
    factory: TaskFactory,
    facilities: Facilities,
    operation: Option<Operation<R>>,
    timeout: Option<Duration>,
}

impl<R: Send + 'static> TaskBuilder<R> {
    pub(crate) fn new(kind: TaskKind, factory: TaskFactory, facilities: Facilities) -> Self {
        Self {
            kind,
            factory,
            facilities,
            operation: None,
            timeout: None,
        }
    }

    /// Sets the operation every execution runs.
    pub fn operation<F>(mut self, f: F) -> Self
    where
        F: Fn(&CancellationToken) -> Result<R, TaskError> + Send + Sync + 'static,
    {
        let operation: Operation<R> = Arc::new(f);
        self.operation = Some(operation);
        self
    }

    /// Sets the timeout for asynchronous runs (zero = no timeout).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Kind the built tasks belong to.
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Builds a task through the kind's construction strategy.
    ///
    /// # Errors
    /// [`RuntimeError::MissingOperation`] if no operation was set.
    pub fn build(&self) -> Result<TaskRef<R>, RuntimeError> {
        let operation = self.operation.clone().ok_or(RuntimeError::MissingOperation)?;
        let task = (self.factory)(TaskParams {
            kind: self.kind.clone(),
            operation: erase(operation),
            timeout: self.timeout,
            facilities: self.facilities.clone(),
        });
        let typed: TaskRef<R> = Arc::new(Typed::new(task));
        Ok(typed)
    }
}

impl<R> Clone for TaskBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            factory: Arc::clone(&self.factory),
            facilities: self.facilities.clone(),
            operation: self.operation.clone(),
            timeout: self.timeout,
        }
    }
}
