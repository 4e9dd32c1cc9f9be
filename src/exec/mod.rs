//! Shared execution facilities.
//!
//! [`Facilities`] bundles everything tasks and timers run on:
//! - [`Pool`]: work pool executing task operations (one lightweight worker per operation);
//! - [`Delayer`]: single-threaded scheduler firing timeouts and background timers;
//! - [`Bus`]: event broadcast, optionally fanned out to a [`SubscriberSet`];
//! - [`ThreadFactory`]: naming strategy shared by the pool and the delayer.
//!
//! ## Wiring
//! ```text
//! FacilitiesBuilder::build()
//!   ├─► ThreadFactory(cfg.thread_name)
//!   ├─► Pool     (multi-thread runtime, threads "<prefix>-pool-N")
//!   ├─► Delayer  (current-thread runtime on "<prefix>-delayer-N")
//!   ├─► Bus      (cfg.bus_capacity_clamped())
//!   └─► if subscribers: SubscriberSet on the pool + listener Bus ─► set.emit()
//! ```
//!
//! Facilities are passed explicitly (see [`TaskRegistry::new`](crate::TaskRegistry::new)).
//! [`Facilities::global`] gives the process-wide default, built lazily once and
//! kept until process exit.

mod delayer;
mod factory;
mod pool;

pub use delayer::{Delayer, Scheduled};
pub use factory::ThreadFactory;
pub use pool::Pool;

use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast::error::RecvError;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

static GLOBAL: OnceLock<Facilities> = OnceLock::new();

struct Inner {
    cfg: Config,
    factory: ThreadFactory,
    pool: Pool,
    delayer: Delayer,
    bus: Bus,
}

/// Execution context shared by tasks, timers and the registry.
///
/// Cheap to clone; all clones share the same pool, delayer and bus.
#[derive(Clone)]
pub struct Facilities {
    inner: Arc<Inner>,
}

impl Facilities {
    /// Builds facilities from `cfg` without subscribers.
    pub fn new(cfg: Config) -> Result<Self, RuntimeError> {
        Self::builder(cfg).build()
    }

    /// Starts a builder for facilities with subscribers.
    pub fn builder(cfg: Config) -> FacilitiesBuilder {
        FacilitiesBuilder::new(cfg)
    }

    /// Returns the process-wide facilities, building them with
    /// [`Config::default`] on first use unless [`install_global`](Self::install_global)
    /// ran earlier.
    ///
    /// # Panics
    /// If the OS refuses to create the facility threads on first use.
    pub fn global() -> &'static Facilities {
        GLOBAL.get_or_init(|| {
            Facilities::new(Config::default())
                .unwrap_or_else(|err| panic!("cannot start global facilities: {err}"))
        })
    }

    /// Installs `facilities` as the process-wide default.
    ///
    /// Fails (returning the argument) if the global facilities already exist.
    pub fn install_global(facilities: Facilities) -> Result<(), Facilities> {
        GLOBAL.set(facilities)
    }

    /// Configuration the facilities were built with.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// The shared thread-creation strategy.
    pub fn thread_factory(&self) -> &ThreadFactory {
        &self.inner.factory
    }

    /// The work pool.
    pub fn pool(&self) -> &Pool {
        &self.inner.pool
    }

    /// The delayed-execution facility.
    pub fn delayer(&self) -> &Delayer {
        &self.inner.delayer
    }

    /// The event bus.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Fire-and-forget submission to the pool.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.pool.execute(f);
    }
}

/// Builder for constructing [`Facilities`] with optional subscribers.
pub struct FacilitiesBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl FacilitiesBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the facilities, starting the pool and the delayer thread.
    pub fn build(self) -> Result<Facilities, RuntimeError> {
        let factory = ThreadFactory::new(self.cfg.thread_name.as_ref());
        let pool = Pool::new(&self.cfg, &factory)?;
        let delayer = Delayer::new(&factory)?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone(), pool.handle());
            spawn_listener(&pool, &bus, set);
        }

        Ok(Facilities {
            inner: Arc::new(Inner {
                cfg: self.cfg,
                factory,
                pool,
                delayer,
                bus,
            }),
        })
    }
}

/// Forwards bus events to the subscriber set until the bus closes.
fn spawn_listener(pool: &Pool, bus: &Bus, set: SubscriberSet) {
    let mut rx = bus.subscribe();
    pool.handle().spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
