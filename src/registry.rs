//! # Task registry - pluggable task implementations by kind.
//!
//! The registry maps a [`TaskKind`] to a construction strategy ([`TaskFactory`]).
//! Every strategy has the same shape, `TaskParams<AnyValue> -> TaskRef<AnyValue>`,
//! so new task variants plug in at runtime without any type introspection.
//!
//! ## Architecture
//! ```text
//! register(kind, factory) ──► table[kind] = factory      (upsert, ImplRegistered)
//! deregister(kind)        ──► table.remove(kind)         (no-op if absent)
//! task_builder::<R>(kind) ──► TaskBuilder<R>{ factory }  (UnknownTaskImpl if absent)
//!                                  │
//!                                  └─ build() ─► factory(params) ─► Typed<R> view
//! clean_resources()       ──► table.clear()              (RegistryCleared)
//! ```
//!
//! ## Rules
//! - `"basic"` ([`TaskKind::BASIC`]) is registered by [`TaskRegistry::new`].
//! - The table is read-mostly; lookups take a shared lock, mutations an exclusive one.
//! - A builder keeps the strategy it was created with; later deregistration does
//!   not affect it.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeError, TaskError};
use crate::events::{Event, EventKind};
use crate::exec::Facilities;
use crate::tasks::{AnyValue, BasicTask, TaskBuilder, TaskParams, TaskRef};

/// Construction strategy for one task kind.
pub type TaskFactory = Arc<dyn Fn(TaskParams<AnyValue>) -> TaskRef<AnyValue> + Send + Sync>;

/// Identifier of a task implementation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKind(Cow<'static, str>);

impl TaskKind {
    /// Kind of the default implementation ([`BasicTask`]).
    pub const BASIC: TaskKind = TaskKind(Cow::Borrowed("basic"));

    /// Creates a kind from any string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the kind as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TaskKind {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for TaskKind {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// Resource-cleanup contract invoked at teardown.
pub trait Cleaner {
    /// Releases everything the implementor holds.
    fn clean_resources(&self);
}

/// Table of task implementations.
pub struct TaskRegistry {
    factories: RwLock<HashMap<TaskKind, TaskFactory>>,
    facilities: Facilities,
}

impl TaskRegistry {
    /// Creates a registry with the `"basic"` implementation registered.
    pub fn new(facilities: Facilities) -> Self {
        let registry = Self {
            factories: RwLock::new(HashMap::new()),
            facilities,
        };
        registry.register(TaskKind::BASIC, |params: TaskParams<AnyValue>| -> TaskRef<AnyValue> {
            Arc::new(BasicTask::new(params))
        });
        registry
    }

    /// Process-wide registry over [`Facilities::global`], created on first use.
    pub fn global() -> &'static TaskRegistry {
        static GLOBAL: OnceLock<TaskRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| TaskRegistry::new(Facilities::global().clone()))
    }

    /// Facilities every built task runs on.
    pub fn facilities(&self) -> &Facilities {
        &self.facilities
    }

    /// Registers (or replaces) the construction strategy for `kind`.
    pub fn register<F>(&self, kind: impl Into<TaskKind>, factory: F) -> &Self
    where
        F: Fn(TaskParams<AnyValue>) -> TaskRef<AnyValue> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let ev = Event::new(EventKind::ImplRegistered).with_task(kind.as_str());
        self.factories.write().insert(kind, Arc::new(factory));
        self.facilities.bus().publish(ev);
        self
    }

    /// Removes the strategy for `kind`; no-op if absent.
    pub fn deregister(&self, kind: impl Into<TaskKind>) -> &Self {
        let kind = kind.into();
        if self.factories.write().remove(&kind).is_some() {
            self.facilities
                .bus()
                .publish(Event::new(EventKind::ImplDeregistered).with_task(kind.as_str()));
        }
        self
    }

    /// Returns `true` if a strategy is registered for `kind`.
    pub fn is_registered(&self, kind: impl Into<TaskKind>) -> bool {
        self.factories.read().contains_key(&kind.into())
    }

    /// Returns the registered kinds, sorted.
    pub fn kinds(&self) -> Vec<TaskKind> {
        let mut kinds: Vec<TaskKind> = self.factories.read().keys().cloned().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Returns a builder bound to the strategy registered for `kind`.
    ///
    /// # Errors
    /// [`RuntimeError::UnknownTaskImpl`] if nothing is registered for `kind`.
    pub fn task_builder<R: Send + 'static>(
        &self,
        kind: impl Into<TaskKind>,
    ) -> Result<TaskBuilder<R>, RuntimeError> {
        let kind = kind.into();
        let factory = self
            .factories
            .read()
            .get(&kind)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownTaskImpl {
                kind: kind.to_string(),
            })?;
        Ok(TaskBuilder::new(kind, factory, self.facilities.clone()))
    }

    /// Builds a task of `kind` around `op`, then either submits it without
    /// waiting (`nonblocking`) or runs it on the calling thread.
    ///
    /// The non-blocking form discards the outcome; the blocking form returns a
    /// fault raised by `op`.
    pub fn do_task<F>(
        &self,
        kind: impl Into<TaskKind>,
        nonblocking: bool,
        op: F,
    ) -> Result<(), RuntimeError>
    where
        F: Fn(&CancellationToken) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        let task = self.task_builder::<()>(kind)?.operation(op).build()?;
        if nonblocking {
            task.detach();
        } else {
            task.block_or_throw()?;
        }
        Ok(())
    }
}

impl Cleaner for TaskRegistry {
    fn clean_resources(&self) {
        self.factories.write().clear();
        self.facilities.bus().publish(Event::new(EventKind::RegistryCleared));
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry").field("kinds", &self.kinds()).finish()
    }
}
