//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used by [`Facilities`](crate::Facilities) to deliver events published on the
//! [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Task/Timer/Registry ── publish(Event) ──► Bus ──► Facilities listener
//!                                                          │
//!                                                   SubscriberSet::emit
//!                                                 ┌─────────┼─────────┐
//!                                                 ▼         ▼         ▼
//!                                             LogWriter   Metrics   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskloom::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct TimeoutCounter;
//!
//! #[async_trait]
//! impl Subscribe for TimeoutCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TimeoutHit {
//!             // increment counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

pub(crate) use subscriber_set::panic_message;
