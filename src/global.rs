//! # Process-wide entry points.
//!
//! Thin forwarders to [`Facilities::global`] and [`TaskRegistry::global`] for code
//! that does not pass facilities around explicitly.
//!
//! ## Example
//! ```rust
//! use taskloom::{TaskError, global};
//!
//! global::do_basic_task(false, |_ctx| Ok(())).unwrap();
//!
//! let err = global::do_basic_task(false, |_ctx| Err(TaskError::fail("boom"))).unwrap_err();
//! assert!(err.to_string().contains("boom"));
//! ```

use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeError, TaskError};
use crate::exec::Facilities;
use crate::registry::{Cleaner, TaskKind, TaskRegistry};
use crate::tasks::{AnyValue, TaskBuilder, TaskParams, TaskRef};

/// Fire-and-forget submission to the shared pool.
pub fn execute<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    Facilities::global().execute(f);
}

/// [`TaskRegistry::do_task`] on the process-wide registry.
pub fn do_task<F>(kind: impl Into<TaskKind>, nonblocking: bool, op: F) -> Result<(), RuntimeError>
where
    F: Fn(&CancellationToken) -> Result<(), TaskError> + Send + Sync + 'static,
{
    TaskRegistry::global().do_task(kind, nonblocking, op)
}

/// [`do_task`] with the `"basic"` implementation.
pub fn do_basic_task<F>(nonblocking: bool, op: F) -> Result<(), RuntimeError>
where
    F: Fn(&CancellationToken) -> Result<(), TaskError> + Send + Sync + 'static,
{
    do_task(TaskKind::BASIC, nonblocking, op)
}

/// [`TaskRegistry::task_builder`] on the process-wide registry.
pub fn task_builder<R: Send + 'static>(
    kind: impl Into<TaskKind>,
) -> Result<TaskBuilder<R>, RuntimeError> {
    TaskRegistry::global().task_builder(kind)
}

/// [`TaskRegistry::register`] on the process-wide registry.
pub fn register_task_impl<F>(kind: impl Into<TaskKind>, factory: F)
where
    F: Fn(TaskParams<AnyValue>) -> TaskRef<AnyValue> + Send + Sync + 'static,
{
    TaskRegistry::global().register(kind, factory);
}

/// [`TaskRegistry::deregister`] on the process-wide registry.
pub fn deregister_task_impl(kind: impl Into<TaskKind>) {
    TaskRegistry::global().deregister(kind);
}

/// Clears the process-wide registry.
pub fn cleanup() {
    TaskRegistry::global().clean_resources();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::BasicTask;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_execute_runs_on_shared_pool() {
        let (tx, rx) = mpsc::channel();
        execute(move || {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(2)).expect("ran");
    }

    #[test]
    fn test_register_and_deregister_forward_to_global() {
        register_task_impl("global-forward", |params| Arc::new(BasicTask::new(params)));
        let task = task_builder::<u8>("global-forward")
            .expect("registered")
            .operation(|_| Ok(4))
            .build()
            .expect("build");
        assert_eq!(task.block_ignoring_result(), Some(4));

        deregister_task_impl("global-forward");
        assert!(task_builder::<u8>("global-forward").is_err());
    }

    #[test]
    fn test_do_basic_task_blocking_fault() {
        let err = do_basic_task(false, |_| Err(TaskError::fail("boom"))).expect_err("fault");
        assert!(err.to_string().contains("boom"));
    }
}
