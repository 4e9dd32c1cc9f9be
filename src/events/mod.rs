//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by tasks, timers and the registry.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `BasicTask`, `After`/`Periodic` timers, `TaskRegistry`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `Facilities` (fans out to `SubscriberSet`),
//!   or any receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
