//! # Shared timer machinery.
//!
//! [`Core`] holds everything both timer variants need:
//! - a mutex + condvar pair for **calling-thread** waits;
//! - the active **background** handle (a [`Scheduled`] on the delayer);
//! - the optional dispatch strategy (the [`Delayer`]);
//! - the operation run at expiry.
//!
//! ## Activation
//! Every `start()` takes a fresh activation id. Exactly one activation is live
//! at a time: either `wait.active == Some(id)` (a thread is parked in
//! [`Core::run_here`]) or `background == Some((id, handle))`. `stop()` clears
//! whichever is set and wakes the waiting thread; a loop that finds its id gone
//! returns silently.
//!
//! Concurrent `start()` calls are serialised by the arming lock: the previous
//! activation is stopped and the new one armed under that lock. Arming also
//! displaces whatever activation it finds, so a slot never holds two.
//!
//! A background activation keeps its `Core` alive through the scheduled
//! callback: dropping every timer handle does not cancel it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::exec::{Delayer, Facilities, Scheduled};
use crate::subscribers::panic_message;

/// Operation run by a timer at expiry.
pub(crate) type TimerOp = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct WaitState {
    active: Option<u64>,
}

pub(crate) struct Core<S> {
    label: &'static str,
    pub(crate) settings: Mutex<S>,
    op: Mutex<Option<TimerOp>>,
    dispatch: Mutex<Option<Delayer>>,
    bus: Mutex<Option<Bus>>,
    wait: Mutex<WaitState>,
    wake: Condvar,
    background: Mutex<Option<(u64, Scheduled)>>,
    activations: AtomicU64,
    arming: Mutex<()>,
}

impl<S: Send + 'static> Core<S> {
    pub(crate) fn new(label: &'static str, settings: S) -> Arc<Self> {
        Arc::new(Self {
            label,
            settings: Mutex::new(settings),
            op: Mutex::new(None),
            dispatch: Mutex::new(None),
            bus: Mutex::new(None),
            wait: Mutex::new(WaitState::default()),
            wake: Condvar::new(),
            background: Mutex::new(None),
            activations: AtomicU64::new(0),
            arming: Mutex::new(()),
        })
    }

    pub(crate) fn set_op(&self, op: TimerOp) {
        *self.op.lock() = Some(op);
    }

    pub(crate) fn op(&self) -> Option<TimerOp> {
        self.op.lock().clone()
    }

    pub(crate) fn set_dispatch(&self, facilities: &Facilities) {
        *self.dispatch.lock() = Some(facilities.delayer().clone());
        *self.bus.lock() = Some(facilities.bus().clone());
    }

    pub(crate) fn set_bus(&self, bus: Bus) {
        *self.bus.lock() = Some(bus);
    }

    pub(crate) fn dispatch(&self) -> Option<Delayer> {
        self.dispatch.lock().clone()
    }

    pub(crate) fn next_activation(&self) -> u64 {
        self.activations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Serialises `start()`: hold the guard from stopping the previous
    /// activation until the new one is armed.
    pub(crate) fn arming(&self) -> MutexGuard<'_, ()> {
        self.arming.lock()
    }

    pub(crate) fn is_active(&self) -> bool {
        let background = self
            .background
            .lock()
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished());
        background || self.wait.lock().active.is_some()
    }

    /// Ends the live activation, if any.
    pub(crate) fn stop(&self) -> bool {
        if let Some((_, handle)) = self.background.lock().take() {
            handle.cancel();
            self.publish(Event::new(EventKind::TimerStopped));
            return true;
        }

        let mut wait = self.wait.lock();
        if wait.active.take().is_some() {
            self.wake.notify_all();
            drop(wait);
            self.publish(Event::new(EventKind::TimerStopped));
            return true;
        }
        false
    }

    /// Arms a background activation; `schedule` receives the activation id and
    /// must return the delayer handle.
    ///
    /// The background slot stays locked while scheduling, so a callback that
    /// fires immediately still finds its own handle in place.
    pub(crate) fn start_background<F>(&self, first: Duration, schedule: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(u64) -> Result<Scheduled, RuntimeError>,
    {
        let id = self.next_activation();
        let mut background = self.background.lock();
        let handle = schedule(id)?;
        if let Some((_, displaced)) = background.replace((id, handle)) {
            displaced.cancel();
        }
        drop(background);

        self.publish(Event::new(EventKind::TimerStarted).with_delay(first));
        Ok(())
    }

    /// Clears the background slot once a one-shot activation has fired.
    pub(crate) fn finish_background(&self, id: u64) {
        let mut background = self.background.lock();
        if background.as_ref().is_some_and(|(live, _)| *live == id) {
            *background = None;
            drop(background);
            self.publish(Event::new(EventKind::TimerStopped));
        }
    }

    /// Arms a calling-thread activation and returns its id.
    ///
    /// A thread still parked on a displaced activation is woken and returns.
    pub(crate) fn arm_here(&self, first: Duration) -> u64 {
        let id = self.next_activation();
        let mut wait = self.wait.lock();
        if wait.active.replace(id).is_some() {
            self.wake.notify_all();
        }
        drop(wait);

        self.publish(Event::new(EventKind::TimerStarted).with_delay(first));
        id
    }

    /// Blocks the calling thread for activation `id`: waits `first`, fires,
    /// then, for periodic timers, keeps firing every `then` until stopped.
    ///
    /// The mutex is released while the operation runs, so the operation (or
    /// any other thread) may call `stop()`.
    pub(crate) fn run_here(&self, id: u64, first: Duration, then: Option<Duration>, op: &TimerOp) {
        let mut deadline = Instant::now() + first;
        let mut wait = self.wait.lock();
        loop {
            while wait.active == Some(id) {
                if self.wake.wait_until(&mut wait, deadline).timed_out() {
                    break;
                }
            }
            if wait.active != Some(id) {
                return;
            }

            MutexGuard::unlocked(&mut wait, || self.fire(op));
            if wait.active != Some(id) {
                return;
            }

            match then {
                Some(interval) => deadline = (deadline + interval).max(Instant::now()),
                None => {
                    wait.active = None;
                    drop(wait);
                    self.publish(Event::new(EventKind::TimerStopped));
                    return;
                }
            }
        }
    }

    /// Runs the operation once, containing panics.
    pub(crate) fn fire(&self, op: &TimerOp) {
        self.publish(Event::new(EventKind::TimerFired));
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| op())) {
            tracing::warn!(
                timer = self.label,
                info = %panic_message(payload.as_ref()),
                "timer operation panicked"
            );
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = self.bus.lock().as_ref() {
            bus.publish(ev.with_task(self.label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn counting_op() -> (Arc<AtomicUsize>, TimerOp) {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&hits);
        (hits, Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_background_rearm_cancels_displaced_schedule() {
        let facilities = Facilities::new(Config::default()).expect("facilities");
        let delayer = facilities.delayer().clone();
        let core: Arc<Core<()>> = Core::new("test", ());
        let (hits, op) = counting_op();

        for _ in 0..2 {
            let op = Arc::clone(&op);
            core.start_background(Duration::from_millis(30), |_| {
                Ok(delayer.schedule(Duration::from_millis(30), move || op()))
            })
            .expect("armed");
        }

        thread::sleep(Duration::from_millis(150));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rearm_here_wakes_displaced_waiter() {
        let core: Arc<Core<()>> = Core::new("test", ());
        let (hits, op) = counting_op();

        let first = core.arm_here(Duration::from_secs(5));
        let waiter = {
            let core = Arc::clone(&core);
            let op = Arc::clone(&op);
            thread::spawn(move || {
                let started = Instant::now();
                core.run_here(first, Duration::from_secs(5), None, &op);
                started.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(20));

        let second = core.arm_here(Duration::from_secs(5));
        assert_ne!(first, second);

        let waited = waiter.join().expect("join");
        assert!(waited < Duration::from_secs(5));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(core.is_active());
        assert!(core.stop());
    }
}
