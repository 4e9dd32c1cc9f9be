//! # Shared delayed-execution facility.
//!
//! [`Delayer`] is a single-threaded scheduler: a current-thread tokio runtime
//! driven by one dedicated OS thread (spawned through the shared
//! [`ThreadFactory`]). It fires task timeouts and background timers.
//!
//! ## Rules
//! - Callbacks run **on the delayer thread**, one at a time; a slow callback
//!   delays the others.
//! - A panicking callback is logged and does not stop the delayer.
//! - Every scheduled callback returns a [`Scheduled`] handle; cancelling it
//!   before the deadline guarantees the callback never runs, and ends a
//!   fixed-rate schedule before its next firing.
//!
//! ```text
//! schedule(delay, f)            schedule_at_fixed_rate(initial, period, f)
//!   sleep(delay) ─► f()           tick(initial) ─► f() ─► tick(period) ─► f() ─► …
//!        ▲                              ▲
//!        └── cancelled() wins ──────────┘  (biased select, checked first)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Handle};
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::exec::factory::ThreadFactory;
use crate::subscribers::panic_message;

/// Handle to one scheduled callback.
#[derive(Debug)]
pub struct Scheduled {
    token: CancellationToken,
    abort: AbortHandle,
}

impl Scheduled {
    /// Cancels the callback.
    ///
    /// Returns `true` if the schedule was still pending or running.
    /// A callback already executing is not interrupted; it runs to completion.
    pub fn cancel(&self) -> bool {
        let pending = !self.abort.is_finished() && !self.token.is_cancelled();
        self.token.cancel();
        self.abort.abort();
        pending
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `true` once the schedule has ended (fired, cancelled, or panicked).
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

struct Inner {
    handle: Handle,
    shutdown: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Single-threaded scheduler for delayed and fixed-rate callbacks.
///
/// Cheap to clone; the delayer thread exits when the last clone is dropped.
#[derive(Clone)]
pub struct Delayer {
    inner: Arc<Inner>,
}

impl Delayer {
    /// Starts the delayer thread.
    pub fn new(factory: &ThreadFactory) -> Result<Self, RuntimeError> {
        let init = |source| RuntimeError::FacilityInit {
            facility: "delayer",
            source,
        };

        let rt = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(init)?;
        let handle = rt.handle().clone();
        let shutdown = CancellationToken::new();

        let stop = shutdown.clone();
        factory
            .spawn("delayer", move || rt.block_on(stop.cancelled()))
            .map_err(init)?;

        Ok(Self {
            inner: Arc::new(Inner { handle, shutdown }),
        })
    }

    /// Runs `f` once after `delay`.
    pub fn schedule<F>(&self, delay: Duration, f: F) -> Scheduled
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let join = self.inner.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = time::sleep(delay) => {
                    if !cancelled.is_cancelled() {
                        run_guarded(f);
                    }
                }
            }
        });

        Scheduled {
            token,
            abort: join.abort_handle(),
        }
    }

    /// Runs `f` after `initial`, then every `period` until cancelled.
    ///
    /// Missed ticks are caught up in a burst, keeping a fixed rate.
    ///
    /// # Errors
    /// [`RuntimeError::InvalidInterval`] if `period` is zero.
    pub fn schedule_at_fixed_rate<F>(
        &self,
        initial: Duration,
        period: Duration,
        f: F,
    ) -> Result<Scheduled, RuntimeError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if period.is_zero() {
            return Err(RuntimeError::InvalidInterval);
        }
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let join = self.inner.handle.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + initial, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if cancelled.is_cancelled() {
                            break;
                        }
                        run_guarded(&f);
                    }
                }
            }
        });

        Ok(Scheduled {
            token,
            abort: join.abort_handle(),
        })
    }
}

fn run_guarded<F: FnOnce()>(f: F) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        tracing::warn!(info = %panic_message(payload.as_ref()), "scheduled callback panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    fn delayer() -> Delayer {
        Delayer::new(&ThreadFactory::new("delayer-test")).expect("delayer")
    }

    #[test]
    fn test_schedule_fires_after_delay() {
        let delayer = delayer();
        let (tx, rx) = mpsc::channel();
        let started = std::time::Instant::now();

        let handle = delayer.schedule(Duration::from_millis(30), move || {
            let _ = tx.send(std::time::Instant::now());
        });

        let fired = rx.recv_timeout(Duration::from_secs(2)).expect("fired");
        assert!(fired.duration_since(started) >= Duration::from_millis(30));
        thread::sleep(Duration::from_millis(20));
        assert!(handle.is_finished());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancel_before_deadline_suppresses_callback() {
        let delayer = delayer();
        let (tx, rx) = mpsc::channel::<()>();

        let handle = delayer.schedule(Duration::from_millis(50), move || {
            let _ = tx.send(());
        });
        assert!(handle.cancel());
        assert!(handle.is_cancelled());
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn test_fixed_rate_repeats_until_cancelled() {
        let delayer = delayer();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let handle = delayer
            .schedule_at_fixed_rate(Duration::ZERO, Duration::from_millis(20), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("scheduled");

        thread::sleep(Duration::from_millis(110));
        assert!(handle.cancel());
        let seen = hits.load(Ordering::SeqCst);
        assert!(seen >= 3, "expected several firings, got {seen}");

        thread::sleep(Duration::from_millis(60));
        assert_eq!(hits.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let err = delayer()
            .schedule_at_fixed_rate(Duration::ZERO, Duration::ZERO, || {})
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidInterval));
    }

    #[test]
    fn test_panicking_callback_keeps_delayer_alive() {
        let delayer = delayer();
        delayer.schedule(Duration::ZERO, || panic!("boom"));

        let (tx, rx) = mpsc::channel();
        delayer.schedule(Duration::from_millis(10), move || {
            let _ = tx.send(1);
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(1));
    }
}
