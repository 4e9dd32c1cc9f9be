//! # taskloom
//!
//! **Taskloom** is a small task/timer runtime for Rust.
//!
//! It runs fallible, value-producing operations as single-shot tasks with an
//! optional timeout, schedules one-shot and periodic timers, and lets new task
//! implementations plug in by kind through a registry.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ TaskBuilder  │   │    After     │   │   Periodic   │
//!     │ (op+timeout) │   │ (one-shot)   │   │ (fixed rate) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ build()          │ start()          │ start()
//!            ▼                  │                  │
//!     ┌──────────────┐          │                  │
//!     │ TaskRegistry │          │                  │
//!     │ kind→factory │          │                  │
//!     └──────┬───────┘          │                  │
//!            ▼                  │                  │
//!     ┌──────────────┐          │                  │
//!     │  BasicTask   │          │                  │
//!     │ block()      │──► calling thread ◄─────────┤ (no `.on(..)`)
//!     │ complete(cb) │          │                  │
//!     └──┬────────┬──┘          ▼                  ▼
//!        │        │ timeout ┌───────────────────────────────┐
//!        │        └────────►│ Delayer (single thread)       │
//!        ▼                  └───────────────┬───────────────┘
//! ┌──────────────────┐                      │
//! │ Pool (operations)│                      │
//! └────────┬─────────┘                      │
//!          │  Publishes events:             │ Publishes events:
//!          │  - TaskStarting                │ - TimerStarted / TimerFired
//!          │  - TaskCompleted / TaskFailed  │ - TimerStopped
//!          │  - TimeoutHit / TaskCancelled  │ - TimeoutHit
//!          ▼                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  facilities listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     sub1.on   sub2.on   subN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Asynchronous completion
//! ```text
//! complete(cb)
//!   ├─► arm After(timeout) on the delayer  (if timeout > 0)
//!   └─► run operation on the pool
//!
//! first to finish claims the slot:
//!   ├─ operation Ok(v)      ─► cb(Completed{v, elapsed}), disarm timer
//!   ├─ operation Err(e)     ─► cb(Failed(e)),             disarm timer
//!   ├─ timer fires          ─► cb(Failed(Timeout)),       cancel operation token
//!   └─ operation Canceled   ─► nothing delivered
//! the loser does nothing; `done()` becomes true.
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                            |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------------|
//! | **Tasks**         | Single-shot operations, async with timeout or blocking.       | [`Task`], [`BasicTask`], [`Outcome`]          |
//! | **Registry**      | Pluggable task implementations by kind.                       | [`TaskRegistry`], [`TaskKind`], [`TaskBuilder`] |
//! | **Timers**        | One-shot and periodic, on the caller or the delayer.          | [`timer::After`], [`timer::Periodic`]         |
//! | **Execution**     | Shared pool, delayer and event bus.                           | [`Facilities`], [`Pool`], [`Delayer`]         |
//! | **Subscriber API**| Hook into task/timer/registry events.                         | [`Subscribe`]                                 |
//! | **Errors**        | Typed errors for operations and runtime misuse.               | [`TaskError`], [`RuntimeError`]               |
//! | **Configuration** | Pool sizing, thread names, bus capacity.                      | [`Config`]                                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::mpsc;
//! use std::time::Duration;
//! use taskloom::{Config, Facilities, TaskError, TaskKind, TaskRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = TaskRegistry::new(Facilities::new(Config::default())?);
//!
//!     // Slow operation that gives up once its token is cancelled.
//!     let task = registry
//!         .task_builder::<u64>(TaskKind::BASIC)?
//!         .operation(|ctx| {
//!             for _ in 0..500 {
//!                 if ctx.is_cancelled() {
//!                     return Err(TaskError::Canceled);
//!                 }
//!                 std::thread::sleep(Duration::from_millis(2));
//!             }
//!             Ok(42)
//!         })
//!         .timeout(Duration::from_millis(50))
//!         .build()?;
//!
//!     let (tx, rx) = mpsc::channel();
//!     task.on_complete(move |outcome| {
//!         let _ = tx.send(outcome);
//!     });
//!
//!     let outcome = rx.recv_timeout(Duration::from_secs(5))?;
//!     assert!(outcome.is_timeout());
//!     assert!(task.done());
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod events;
mod exec;
mod registry;
mod subscribers;
mod tasks;

pub mod global;
pub mod timer;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use exec::{Delayer, Facilities, FacilitiesBuilder, Pool, Scheduled, ThreadFactory};
pub use registry::{Cleaner, TaskFactory, TaskKind, TaskRegistry};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    AnyValue, BasicTask, Callback, Completion, Operation, Outcome, Task, TaskBuilder, TaskParams,
    TaskRef,
};
pub use timer::Timer;
pub use tokio_util::sync::CancellationToken;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
