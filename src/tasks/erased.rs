//! # Type erasure between the registry and typed callers.
//!
//! Construction strategies are stored once per kind, so they cannot be generic
//! over the result type. They build tasks over [`AnyValue`]; [`Typed`] wraps such
//! a task back into a `Task<R>` by downcasting every value it produces.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::completion::Completion;
use crate::tasks::outcome::Outcome;
use crate::tasks::task::{Callback, Operation, Task, TaskRef};

/// Result value of a type-erased task.
pub type AnyValue = Box<dyn Any + Send>;

/// Wraps a typed operation so it produces [`AnyValue`].
pub(crate) fn erase<R: Send + 'static>(op: Operation<R>) -> Operation<AnyValue> {
    Arc::new(move |ctx: &CancellationToken| op(ctx).map(|value| Box::new(value) as AnyValue))
}

fn downcast<R: 'static>(outcome: Outcome<AnyValue>) -> Outcome<R> {
    match outcome {
        Outcome::Completed { value, elapsed } => match value.downcast::<R>() {
            Ok(value) => Outcome::Completed {
                value: *value,
                elapsed,
            },
            Err(_) => Outcome::Failed(TaskError::fail(format!(
                "task produced a value that is not `{}`",
                std::any::type_name::<R>()
            ))),
        },
        Outcome::Failed(err) => Outcome::Failed(err),
        Outcome::Cancelled => Outcome::Cancelled,
    }
}

/// `Task<R>` view over a type-erased task.
pub(crate) struct Typed<R> {
    task: TaskRef<AnyValue>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Typed<R> {
    pub(crate) fn new(task: TaskRef<AnyValue>) -> Self {
        Self {
            task,
            _marker: PhantomData,
        }
    }
}

impl<R: Send + 'static> Task<R> for Typed<R> {
    fn id(&self) -> u64 {
        self.task.id()
    }

    fn complete(&self, callback: Option<Callback<R>>) -> Completion {
        let erased = callback.map(|callback| -> Callback<AnyValue> {
            Box::new(move |outcome: Outcome<AnyValue>| callback(downcast(outcome)))
        });
        self.task.complete(erased)
    }

    fn block(&self) -> Outcome<R> {
        downcast(self.task.block())
    }

    fn done(&self) -> bool {
        self.task.done()
    }

    fn cancel(&self) {
        self.task.cancel();
    }
}
