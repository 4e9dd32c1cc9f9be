//! # Periodic timer.
//!
//! [`Periodic`] runs its operation after an initial delay and then every
//! `interval` until stopped. Without an explicit initial delay the first
//! firing happens one interval after `start()`.
//!
//! A zero interval is a configuration fault reported by `start()`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::events::Bus;
use crate::exec::Facilities;
use crate::timer::Timer;
use crate::timer::core::Core;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Rate {
    initial_delay: Option<Duration>,
    interval: Duration,
}

impl Rate {
    fn first(&self) -> Duration {
        self.initial_delay.unwrap_or(self.interval)
    }
}

/// Timer firing repeatedly at a fixed interval.
///
/// Clones share state: `stop()` on any clone ends the activation started by another.
#[derive(Clone)]
pub struct Periodic {
    core: Arc<Core<Rate>>,
}

impl Default for Periodic {
    fn default() -> Self {
        Self::new()
    }
}

impl Periodic {
    /// Creates an idle timer with no interval and no operation.
    pub fn new() -> Self {
        Self {
            core: Core::new("periodic", Rate::default()),
        }
    }

    /// Sets the delay before the first firing.
    pub fn initial_delay(self, delay: Duration) -> Self {
        self.core.settings.lock().initial_delay = Some(delay);
        self
    }

    /// Drops an explicit initial delay; the first firing waits one interval.
    pub fn no_initial_delay(self) -> Self {
        self.core.settings.lock().initial_delay = None;
        self
    }

    /// Sets the interval between firings.
    pub fn interval(self, interval: Duration) -> Self {
        self.core.settings.lock().interval = interval;
        self
    }

    /// Returns the effective initial delay (the interval when none was set).
    pub fn get_initial_delay(&self) -> Duration {
        self.core.settings.lock().first()
    }

    /// Returns the interval.
    pub fn get_interval(&self) -> Duration {
        self.core.settings.lock().interval
    }

    /// Sets the operation to run on every firing.
    pub fn performs<F>(self, op: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.core.set_op(Arc::new(op));
        self
    }

    /// Dispatches the timer to the shared delayer instead of the calling thread.
    pub fn on(self, facilities: &Facilities) -> Self {
        self.core.set_dispatch(facilities);
        self
    }

    /// Publishes timer events on `bus` (useful for calling-thread timers).
    pub fn with_bus(self, bus: Bus) -> Self {
        self.core.set_bus(bus);
        self
    }
}

impl crate::timer::sealed::Sealed for Periodic {}

impl Timer for Periodic {
    fn start(&self) -> Result<bool, RuntimeError> {
        let Some(op) = self.core.op() else {
            return Ok(false);
        };
        let rate = *self.core.settings.lock();
        if rate.interval.is_zero() {
            return Err(RuntimeError::InvalidInterval);
        }
        let arming = self.core.arming();
        self.core.stop();

        match self.core.dispatch() {
            Some(delayer) => {
                let core = Arc::clone(&self.core);
                self.core.start_background(rate.first(), |_| {
                    delayer.schedule_at_fixed_rate(rate.first(), rate.interval, move || core.fire(&op))
                })?;
            }
            None => {
                let id = self.core.arm_here(rate.first());
                drop(arming);
                self.core.run_here(id, rate.first(), Some(rate.interval), &op);
            }
        }
        Ok(true)
    }

    fn stop(&self) -> bool {
        self.core.stop()
    }

    fn is_active(&self) -> bool {
        self.core.is_active()
    }
}
