//! # Shared thread-creation strategy.
//!
//! [`ThreadFactory`] names and spawns every OS thread owned by the facilities:
//! the pool's workers and blocking threads, and the delayer's single thread.
//! Names follow `"{prefix}-{role}-{n}"` with one counter shared by all clones.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Names and spawns facility threads.
#[derive(Clone, Debug)]
pub struct ThreadFactory {
    prefix: Arc<str>,
    counter: Arc<AtomicUsize>,
}

impl ThreadFactory {
    /// Creates a factory using `prefix` for every thread name.
    pub fn new(prefix: impl Into<Arc<str>>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Produces the next thread name for `role`.
    pub fn next_name(&self, role: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{role}-{n}", self.prefix)
    }

    /// Returns a naming closure suitable for `tokio::runtime::Builder::thread_name_fn`.
    pub fn name_fn(&self, role: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
        let me = self.clone();
        move || me.next_name(role)
    }

    /// Spawns a named OS thread running `f`.
    pub fn spawn<F, T>(&self, role: &str, f: F) -> io::Result<thread::JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        thread::Builder::new().name(self.next_name(role)).spawn(f)
    }
}
