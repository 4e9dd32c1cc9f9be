//! # Single-assignment delivery of asynchronous outcomes.
//!
//! One [`Settle`] exists per [`Task::complete`](crate::Task::complete) call. Both
//! racers (the operation and the optional timeout timer) try to claim it; the
//! first claim wins:
//!
//! ```text
//!            ┌── operation finishes ──┐
//! complete() ┤                        ├─► claim() ─► winner: disarm timer,
//!            └── timeout timer fires ─┘                       cancel token,
//!                                                             mark task done,
//!                                                             deliver callback
//!                                          loser:  no-op
//! ```
//!
//! The caller gets a [`Completion`] handle that can abandon the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::outcome::Outcome;
use crate::tasks::task::Callback;
use crate::timer::{After, Timer};

/// Identity attached to every event published for one task.
#[derive(Clone)]
pub(crate) struct Reporter {
    pub(crate) bus: Bus,
    pub(crate) kind: Arc<str>,
    pub(crate) id: u64,
}

impl Reporter {
    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_task(Arc::clone(&self.kind)).with_id(self.id));
    }

    /// Event describing how a run concluded.
    pub(crate) fn outcome_event<V>(outcome: &Outcome<V>) -> Event {
        match outcome {
            Outcome::Completed { elapsed, .. } => {
                Event::new(EventKind::TaskCompleted).with_elapsed(*elapsed)
            }
            Outcome::Failed(err) => Event::new(EventKind::TaskFailed).with_reason(err.as_message()),
            Outcome::Cancelled => Event::new(EventKind::TaskCancelled),
        }
    }
}

pub(crate) struct Settle<R> {
    claimed: AtomicBool,
    callback: Mutex<Option<Callback<R>>>,
    timeout: Mutex<Option<After>>,
    token: CancellationToken,
    done: Arc<AtomicBool>,
    reporter: Reporter,
}

impl<R: Send + 'static> Settle<R> {
    pub(crate) fn new(
        callback: Option<Callback<R>>,
        token: CancellationToken,
        done: Arc<AtomicBool>,
        reporter: Reporter,
    ) -> Arc<Self> {
        Arc::new(Self {
            claimed: AtomicBool::new(false),
            callback: Mutex::new(callback),
            timeout: Mutex::new(None),
            token,
            done,
            reporter,
        })
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Attaches the armed timeout timer so the winner can disarm it.
    pub(crate) fn arm(&self, timer: After) {
        *self.timeout.lock() = Some(timer);
    }

    /// Claims the slot. `Some(outcome)` is delivered to the callback;
    /// `None` settles silently.
    ///
    /// Returns `false` (doing nothing) if another party already settled.
    pub(crate) fn settle(&self, outcome: Option<Outcome<R>>) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if let Some(timer) = self.timeout.lock().take() {
            timer.stop();
        }
        self.token.cancel();
        self.done.store(true, Ordering::Release);

        let callback = self.callback.lock().take();
        if let (Some(callback), Some(outcome)) = (callback, outcome) {
            callback(outcome);
        }
        true
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

trait Abandon: Send + Sync {
    fn abandon(&self) -> bool;
    fn is_settled(&self) -> bool;
}

impl<R: Send + 'static> Abandon for Settle<R> {
    fn abandon(&self) -> bool {
        if self.settle(None) {
            self.reporter.publish(Event::new(EventKind::TaskCancelled));
            return true;
        }
        false
    }

    fn is_settled(&self) -> bool {
        Settle::is_settled(self)
    }
}

/// Handle to one asynchronous run started by [`Task::complete`](crate::Task::complete).
///
/// Dropping the handle does not cancel the run.
#[derive(Clone)]
pub struct Completion {
    settle: Arc<dyn Abandon>,
}

impl Completion {
    pub(crate) fn new<R: Send + 'static>(settle: Arc<Settle<R>>) -> Self {
        Self { settle }
    }

    /// Interrupts the run; the callback will never be called.
    ///
    /// Returns `false` if the run had already delivered (or was already cancelled).
    pub fn cancel(&self) -> bool {
        self.settle.abandon()
    }

    /// Returns `true` once the run delivered, timed out, or was cancelled.
    pub fn is_settled(&self) -> bool {
        self.settle.is_settled()
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("settled", &self.is_settled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn reporter() -> Reporter {
        Reporter {
            bus: Bus::new(16),
            kind: Arc::from("basic"),
            id: 1,
        }
    }

    fn slot(hits: &Arc<AtomicUsize>) -> (Arc<Settle<u32>>, Arc<AtomicBool>) {
        let done = Arc::new(AtomicBool::new(false));
        let h = Arc::clone(hits);
        let cb: Callback<u32> = Box::new(move |_: Outcome<u32>| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let settle = Settle::new(Some(cb), CancellationToken::new(), Arc::clone(&done), reporter());
        (settle, done)
    }

    #[test]
    fn test_first_claim_wins() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (settle, done) = slot(&hits);

        assert!(settle.settle(Some(Outcome::Cancelled)));
        assert!(!settle.settle(Some(Outcome::Cancelled)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(done.load(Ordering::SeqCst));
        assert!(settle.token().is_cancelled());
    }

    #[test]
    fn test_silent_settle_skips_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (settle, done) = slot(&hits);

        assert!(settle.settle(None));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_handle_blocks_later_delivery() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (settle, _) = slot(&hits);
        let mut rx = settle.reporter().bus.subscribe();
        let handle = Completion::new(Arc::clone(&settle));

        assert!(!handle.is_settled());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_settled());

        assert!(!settle.settle(Some(Outcome::Cancelled)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let ev = rx.try_recv().expect("cancel event");
        assert_eq!(ev.kind, EventKind::TaskCancelled);
        assert_eq!(ev.id, Some(1));
    }
}
