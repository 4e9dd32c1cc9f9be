//! # Timers: delayed and periodic execution.
//!
//! Two variants share one contract, [`Timer`]:
//! - [`After`]: fires once after a delay;
//! - [`Periodic`]: fires after an initial delay, then every interval.
//!
//! Each runs either on the **calling thread** (`start()` blocks until the timer
//! is idle again) or on the shared **delayer** after `.on(&facilities)`
//! (`start()` returns immediately).
//!
//! ## State machine
//! ```text
//!            start()                     stop() / After fired
//!   Idle ──────────────► Active ───────────────────────────► Idle
//!                          │  ▲
//!                          └──┘ start() again: stop prior activation, re-arm
//! ```
//!
//! The set of variants is closed: [`Timer`] is sealed.

mod after;
mod core;
mod periodic;

pub use after::{After, DEFAULT_DELAY};
pub use periodic::Periodic;

use crate::error::RuntimeError;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Shared contract of [`After`] and [`Periodic`].
pub trait Timer: sealed::Sealed + Send + Sync {
    /// Moves the timer to its active state, stopping any previous activation first.
    ///
    /// Returns `Ok(false)` when no operation is set. In calling-thread mode this
    /// blocks until the timer is idle again (fired, or stopped from elsewhere).
    ///
    /// # Errors
    /// [`RuntimeError::InvalidInterval`] for a [`Periodic`] timer without a positive interval.
    fn start(&self) -> Result<bool, RuntimeError>;

    /// Moves the timer back to idle.
    ///
    /// Returns `true` if an activation was live, `false` if the timer was already idle.
    fn stop(&self) -> bool;

    /// Returns `true` while an activation is live.
    fn is_active(&self) -> bool;
}

/// Creates a one-shot timer.
pub fn after() -> After {
    After::new()
}

/// Creates a periodic timer.
pub fn periodic() -> Periodic {
    Periodic::new()
}
