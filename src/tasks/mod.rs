//! # Tasks: single-shot, fallible, value-producing work.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait every task implementation satisfies
//! - [`BasicTask`] - default implementation, registered as `"basic"`
//! - [`Outcome`] - result record of one execution
//! - [`Completion`] - handle to one asynchronous execution
//! - [`TaskBuilder`] - fluent construction through the registry
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task<R>>`)

mod basic;
mod builder;
mod completion;
mod erased;
mod outcome;
mod task;

pub use basic::BasicTask;
pub use builder::TaskBuilder;
pub use completion::Completion;
pub use erased::AnyValue;
pub use outcome::Outcome;
pub use task::{Callback, Operation, Task, TaskParams, TaskRef};
