//! # Shared execution facility.
//!
//! [`Pool`] owns a multi-thread tokio runtime. Task operations are blocking
//! closures, so they run on the runtime's blocking pool: one lightweight
//! worker per submitted operation, created on demand and reused while warm.
//! The async workers host the subscriber machinery.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::exec::factory::ThreadFactory;
use crate::subscribers::panic_message;

/// Owns a runtime and shuts it down without blocking when the last owner goes away.
///
/// `shutdown_background` is used so the drop is legal from any context,
/// including a thread of the runtime itself.
pub(crate) struct RuntimeOwner(Option<Runtime>);

impl RuntimeOwner {
    pub(crate) fn new(rt: Runtime) -> Self {
        Self(Some(rt))
    }
}

impl Drop for RuntimeOwner {
    fn drop(&mut self) {
        if let Some(rt) = self.0.take() {
            rt.shutdown_background();
        }
    }
}

/// Work pool running task operations concurrently.
///
/// Cheap to clone; all clones share one runtime.
#[derive(Clone)]
pub struct Pool {
    handle: Handle,
    _owner: Arc<RuntimeOwner>,
}

impl Pool {
    /// Builds the pool from `cfg`, naming threads through `factory`.
    pub fn new(cfg: &Config, factory: &ThreadFactory) -> Result<Self, RuntimeError> {
        let mut builder = Builder::new_multi_thread();
        builder
            .enable_all()
            .thread_name_fn(factory.name_fn("pool"))
            .thread_keep_alive(cfg.keep_alive);
        if let Some(n) = cfg.worker_threads() {
            builder.worker_threads(n);
        }
        if let Some(n) = cfg.blocking_threads() {
            builder.max_blocking_threads(n);
        }

        let rt = builder.build().map_err(|source| RuntimeError::FacilityInit {
            facility: "pool",
            source,
        })?;
        Ok(Self {
            handle: rt.handle().clone(),
            _owner: Arc::new(RuntimeOwner::new(rt)),
        })
    }

    /// Handle to the underlying runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Runs `f` on its own pool thread and returns a join handle for its value.
    ///
    /// Aborting the handle does not interrupt a closure that already started;
    /// cancellation of running work is cooperative.
    pub fn submit<F, T>(&self, f: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handle.spawn_blocking(f)
    }

    /// Fire-and-forget submission; a panic inside `f` is logged and swallowed.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.handle.spawn_blocking(move || {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
                tracing::warn!(info = %panic_message(payload.as_ref()), "executed closure panicked");
            }
        });
    }
}
