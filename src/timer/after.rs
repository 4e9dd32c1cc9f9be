//! # One-shot timer.
//!
//! [`After`] runs its operation once, `delay` after `start()`.
//!
//! - **Calling thread** (no dispatch set): `start()` blocks for the delay, runs
//!   the operation, and returns once the timer is idle again. Another thread can
//!   cut the wait short with `stop()`; the operation then never runs.
//! - **Background** (`on(&facilities)`): `start()` schedules on the delayer and
//!   returns immediately; the timer goes idle on its own after firing. The
//!   schedule holds the timer, so dropping the handle does not cancel it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//! use taskloom::timer::{self, Timer};
//!
//! let fired = Arc::new(AtomicBool::new(false));
//! let flag = fired.clone();
//!
//! let t = timer::after()
//!     .delay(Duration::from_millis(5))
//!     .performs(move || flag.store(true, Ordering::SeqCst));
//!
//! assert!(t.start().unwrap());
//! assert!(fired.load(Ordering::SeqCst));
//! assert!(!t.is_active());
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::RuntimeError;
use crate::events::Bus;
use crate::exec::Facilities;
use crate::timer::Timer;
use crate::timer::core::Core;

/// Default delay of a fresh [`After`] timer.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Timer firing once after a delay.
///
/// Clones share state: `stop()` on any clone ends the activation started by another.
#[derive(Clone)]
pub struct After {
    core: Arc<Core<Duration>>,
}

impl Default for After {
    fn default() -> Self {
        Self::new()
    }
}

impl After {
    /// Creates an idle timer with [`DEFAULT_DELAY`] and no operation.
    pub fn new() -> Self {
        Self {
            core: Core::new("after", DEFAULT_DELAY),
        }
    }

    /// Sets the delay.
    pub fn delay(self, delay: Duration) -> Self {
        *self.core.settings.lock() = delay;
        self
    }

    /// Returns the current delay.
    pub fn get_delay(&self) -> Duration {
        *self.core.settings.lock()
    }

    /// Sets the operation to run at expiry.
    pub fn performs<F>(self, op: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.core.set_op(Arc::new(op));
        self
    }

    /// Dispatches the timer to the shared delayer instead of the calling thread.
    ///
    /// Timer events are published on the facilities' bus.
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

impl crate::timer::sealed::Sealed for After {}

impl Timer for After {
    fn start(&self) -> Result<bool, RuntimeError> {
        let Some(op) = self.core.op() else {
            return Ok(false);
        };
        let arming = self.core.arming();
        self.core.stop();
        let delay = self.get_delay();

        match self.core.dispatch() {
            Some(delayer) => {
                let core = Arc::clone(&self.core);
                self.core.start_background(delay, |id| {
                    Ok(delayer.schedule(delay, move || {
                        core.fire(&op);
                        core.finish_background(id);
                    }))
                })?;
            }
            None => {
                let id = self.core.arm_here(delay);
                drop(arming);
                self.core.run_here(id, delay, None, &op);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, mpsc};
    use std::thread;
    use std::time::Instant;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&hits);
        (hits, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_start_without_operation_is_noop() {
        let t = After::new();
        assert!(!t.start().expect("start"));
        assert!(!t.is_active());
        assert_eq!(t.get_delay(), DEFAULT_DELAY);
    }

    #[test]
    fn test_zero_delay_fires_immediately_on_calling_thread() {
        let (hits, op) = counter();
        let t = After::new().delay(Duration::ZERO).performs(op);

        let started = Instant::now();
        assert!(t.start().expect("start"));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!t.is_active());
        assert!(!t.stop());
    }

    #[test]
    fn test_calling_thread_waits_for_delay() {
        let (hits, op) = counter();
        let t = After::new().delay(Duration::from_millis(40)).performs(op);

        let started = Instant::now();
        t.start().expect("start");
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_from_other_thread_interrupts_wait() {
        let (hits, op) = counter();
        let t = After::new().delay(Duration::from_secs(5)).performs(op);
        let remote = t.clone();

        let waiter = thread::spawn(move || {
            let started = Instant::now();
            let res = remote.start();
            (res.ok(), started.elapsed())
        });

        while !t.is_active() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(t.stop());
        assert!(!t.stop());

        let (res, waited) = waiter.join().expect("join");
        assert_eq!(res, Some(true));
        assert!(waited < Duration::from_secs(5));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_background_fires_and_goes_idle() {
        let facilities = Facilities::new(Config::default()).expect("facilities");
        let (tx, rx) = mpsc::channel();
        let t = After::new()
            .delay(Duration::from_millis(20))
            .performs(move || {
                let _ = tx.send(());
            })
            .on(&facilities);

        let started = Instant::now();
        assert!(t.start().expect("start"));
        assert!(started.elapsed() < Duration::from_millis(20));
        assert!(t.is_active());

        rx.recv_timeout(Duration::from_secs(2)).expect("fired");
        thread::sleep(Duration::from_millis(20));
        assert!(!t.is_active());
        assert!(!t.stop());
    }

    #[test]
    fn test_background_stop_twice() {
        let facilities = Facilities::new(Config::default()).expect("facilities");
        let (hits, op) = counter();
        let t = After::new()
            .delay(Duration::from_millis(100))
            .performs(op)
            .on(&facilities);

        t.start().expect("start");
        assert!(t.stop());
        assert!(!t.stop());

        thread::sleep(Duration::from_millis(150));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restart_replaces_previous_activation() {
        let facilities = Facilities::new(Config::default()).expect("facilities");
        let (hits, op) = counter();
        let t = After::new()
            .delay(Duration::from_millis(40))
            .performs(op)
            .on(&facilities);

        t.start().expect("first");
        t.start().expect("second");

        thread::sleep(Duration::from_millis(120));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_background_fires_after_handle_dropped() {
        let facilities = Facilities::new(Config::default()).expect("facilities");
        let (tx, rx) = mpsc::channel();

        let started = After::new()
            .delay(Duration::from_millis(20))
            .performs(move || {
                let _ = tx.send(());
            })
            .on(&facilities)
            .start()
            .expect("start");
        assert!(started);

        rx.recv_timeout(Duration::from_millis(500)).expect("fired");
    }

    #[test]
    fn test_concurrent_start_fires_once() {
        let facilities = Facilities::new(Config::default()).expect("facilities");
        let (hits, op) = counter();
        let t = After::new()
            .delay(Duration::from_millis(30))
            .performs(op)
            .on(&facilities);

        let barrier = Arc::new(Barrier::new(8));
        let starters: Vec<_> = (0..8)
            .map(|_| {
                let t = t.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    t.start().expect("start");
                })
            })
            .collect();
        for s in starters {
            s.join().expect("join");
        }

        thread::sleep(Duration::from_millis(150));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!t.is_active());
    }

    #[test]
    fn test_restart_on_calling_thread_releases_first_waiter() {
        let (hits, op) = counter();
        let t = After::new().delay(Duration::from_secs(5)).performs(op);
        let first = t.clone();

        let waiter = thread::spawn(move || {
            let started = Instant::now();
            first.start().expect("start");
            started.elapsed()
        });
        while !t.is_active() {
            thread::sleep(Duration::from_millis(1));
        }

        let second = t.clone();
        let restarter = thread::spawn(move || second.start().expect("restart"));

        let waited = waiter.join().expect("join");
        assert!(waited < Duration::from_secs(5));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        while !t.is_active() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(t.stop());
        assert!(restarter.join().expect("join"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
