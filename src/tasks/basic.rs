//! # Default task implementation (`"basic"`).
//!
//! [`BasicTask`] runs its operation either on the calling thread
//! ([`Task::block`]) or on the shared pool ([`Task::complete`]).
//!
//! ## Asynchronous run
//! ```text
//! complete(cb)
//!   ├─► token = task_token.child_token()
//!   ├─► settle = Settle { cb, token }
//!   ├─► if timeout: After(timeout) on the delayer ─► settle(Failed(Timeout)) + TimeoutHit
//!   └─► pool.execute:
//!         ├─ settled or token cancelled? ─► return (nothing runs)
//!         ├─ publish TaskStarting
//!         ├─ run operation (panics captured)
//!         │     ├─ Ok(v)           ─► settle(Completed{v, elapsed}) + TaskCompleted
//!         │     ├─ Err(Canceled)   ─► settle(None)                  + TaskCancelled
//!         │     └─ Err(e) / panic  ─► settle(Failed(e))             + TaskFailed
//!         └─ losing the race: nothing delivered, nothing published
//! ```
//!
//! The timeout timer is armed before the operation is submitted, so a slow pool
//! cannot delay the timeout.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::exec::Facilities;
use crate::subscribers::panic_message;
use crate::tasks::completion::{Completion, Reporter, Settle};
use crate::tasks::outcome::Outcome;
use crate::tasks::task::{Callback, Operation, Task, TaskParams};
use crate::timer::{After, Timer};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct Inner<R> {
    operation: Operation<R>,
    timeout: Option<Duration>,
    done: Arc<AtomicBool>,
    token: CancellationToken,
    facilities: Facilities,
    reporter: Reporter,
}

impl<R: Send + 'static> Inner<R> {
    /// Runs the operation once on the current thread.
    fn run(&self, token: &CancellationToken) -> Outcome<R> {
        let mut ev = Event::new(EventKind::TaskStarting);
        if let Some(timeout) = self.timeout {
            ev = ev.with_timeout(timeout);
        }
        self.reporter.publish(ev);

        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| (self.operation)(token))) {
            Ok(Ok(value)) => Outcome::Completed {
                value,
                elapsed: started.elapsed(),
            },
            Ok(Err(TaskError::Canceled)) => Outcome::Cancelled,
            Ok(Err(err)) => Outcome::Failed(err),
            Err(payload) => Outcome::Failed(TaskError::Panicked {
                info: panic_message(payload.as_ref()),
            }),
        }
    }
}

/// Task running a single operation with an optional asynchronous timeout.
pub struct BasicTask<R> {
    id: u64,
    inner: Arc<Inner<R>>,
}

impl<R: Send + 'static> BasicTask<R> {
    /// Builds a task from construction parameters.
    ///
    /// A zero timeout means "no timeout".
    pub fn new(params: TaskParams<R>) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let reporter = Reporter {
            bus: params.facilities.bus().clone(),
            kind: Arc::from(params.kind.as_str()),
            id,
        };
        Self {
            id,
            inner: Arc::new(Inner {
                operation: params.operation,
                timeout: params.timeout.filter(|t| !t.is_zero()),
                done: Arc::new(AtomicBool::new(false)),
                token: CancellationToken::new(),
                facilities: params.facilities,
                reporter,
            }),
        }
    }

    /// Timeout applied to asynchronous runs, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    fn arm_timeout(&self, settle: &Arc<Settle<R>>, timeout: Duration) {
        let weak = Arc::downgrade(settle);
        let timer = After::new()
            .delay(timeout)
            .on(&self.inner.facilities)
            .performs(move || {
                let Some(settle) = weak.upgrade() else {
                    return;
                };
                if settle.settle(Some(Outcome::Failed(TaskError::Timeout { timeout }))) {
                    settle
                        .reporter()
                        .publish(Event::new(EventKind::TimeoutHit).with_timeout(timeout));
                }
            });

        settle.arm(timer.clone());
        if let Err(err) = timer.start() {
            tracing::warn!(task = self.id, error = %err, "cannot arm timeout");
        }
    }
}

impl<R: Send + 'static> Task<R> for BasicTask<R> {
    fn id(&self) -> u64 {
        self.id
    }

    fn complete(&self, callback: Option<Callback<R>>) -> Completion {
        let settle = Settle::new(
            callback,
            self.inner.token.child_token(),
            Arc::clone(&self.inner.done),
            self.inner.reporter.clone(),
        );

        if let Some(timeout) = self.inner.timeout {
            self.arm_timeout(&settle, timeout);
        }

        let inner = Arc::clone(&self.inner);
        let slot = Arc::clone(&settle);
        self.inner.facilities.execute(move || {
            if slot.is_settled() {
                return;
            }
            let token = slot.token();
            if token.is_cancelled() {
                if slot.settle(None) {
                    inner.reporter.publish(Event::new(EventKind::TaskCancelled));
                }
                return;
            }

            let outcome = inner.run(token);
            let ev = Reporter::outcome_event(&outcome);
            let delivered = match outcome {
                Outcome::Cancelled => slot.settle(None),
                other => slot.settle(Some(other)),
            };
            if delivered {
                inner.reporter.publish(ev);
            }
        });

        Completion::new(settle)
    }

    fn block(&self) -> Outcome<R> {
        let token = self.inner.token.child_token();
        let outcome = self.inner.run(&token);
        self.inner.reporter.publish(Reporter::outcome_event(&outcome));
        self.inner.done.store(true, Ordering::Release);
        outcome
    }

    fn done(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.inner.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::registry::TaskKind;
    use std::sync::mpsc;
    use std::thread;

    fn facilities() -> Facilities {
        Facilities::new(Config::default()).expect("facilities")
    }

    fn task<F>(facilities: &Facilities, timeout: Option<Duration>, op: F) -> BasicTask<u32>
    where
        F: Fn(&CancellationToken) -> Result<u32, TaskError> + Send + Sync + 'static,
    {
        BasicTask::new(TaskParams {
            kind: TaskKind::BASIC,
            operation: Arc::new(op),
            timeout,
            facilities: facilities.clone(),
        })
    }

    fn sleepy(
        ms: u64,
        value: u32,
    ) -> impl Fn(&CancellationToken) -> Result<u32, TaskError> + Send + Sync + 'static {
        move |ctx: &CancellationToken| {
            let deadline = Instant::now() + Duration::from_millis(ms);
            while Instant::now() < deadline {
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                thread::sleep(Duration::from_millis(2));
            }
            Ok(value)
        }
    }

    #[test]
    fn test_block_returns_value_and_marks_done() {
        let f = facilities();
        let t = task(&f, None, |_| Ok(42));
        assert!(!t.done());

        let out = t.block();
        assert_eq!(out.value(), Some(&42));
        assert!(out.elapsed().is_some());
        assert!(t.done());
    }

    #[test]
    fn test_block_captures_fault() {
        let f = facilities();
        let t = task(&f, None, |_| Err(TaskError::fail("boom")));

        let out = t.block();
        assert_eq!(out.error(), Some(&TaskError::fail("boom")));
        assert!(out.value().is_none());
        assert_eq!(t.block_or_throw(), Err(TaskError::fail("boom")));
    }

    #[test]
    fn test_block_captures_panic() {
        let f = facilities();
        let t = task(&f, None, |_| panic!("kaboom"));

        match t.block() {
            Outcome::Failed(TaskError::Panicked { info }) => assert!(info.contains("kaboom")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_block_ignores_timeout() {
        let f = facilities();
        let t = task(&f, Some(Duration::from_millis(10)), sleepy(60, 5));

        let out = t.block();
        assert_eq!(out.value(), Some(&5));
        assert!(!out.completed_within(Duration::from_millis(10)));
    }

    #[test]
    fn test_complete_delivers_value() {
        let f = facilities();
        let t = task(&f, None, |_| Ok(7));
        let (tx, rx) = mpsc::channel();

        let started = Instant::now();
        let cb: Callback<u32> = Box::new(move |o: Outcome<u32>| {
            let _ = tx.send(o);
        });
        t.complete(Some(cb));
        assert!(started.elapsed() < Duration::from_millis(50));

        let out = rx.recv_timeout(Duration::from_secs(2)).expect("delivered");
        assert_eq!(out.into_value(), Some(7));
        assert!(t.done());
    }

    #[test]
    fn test_complete_times_out_and_interrupts() {
        let f = facilities();
        let seen_cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&seen_cancel);
        let t = task(&f, Some(Duration::from_millis(30)), move |ctx| {
            let deadline = Instant::now() + Duration::from_secs(2);
            while Instant::now() < deadline {
                if ctx.is_cancelled() {
                    flag.store(true, Ordering::SeqCst);
                    return Err(TaskError::Canceled);
                }
                thread::sleep(Duration::from_millis(2));
            }
            Ok(1)
        });
        let (tx, rx) = mpsc::channel();

        let started = Instant::now();
        t.complete(Some(Box::new(move |o: Outcome<u32>| {
            let _ = tx.send(o);
        })));

        let out = rx.recv_timeout(Duration::from_secs(2)).expect("delivered");
        assert!(out.is_timeout());
        assert!(started.elapsed() < Duration::from_millis(500));

        thread::sleep(Duration::from_millis(50));
        assert!(seen_cancel.load(Ordering::SeqCst));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_fast_operation_beats_timeout_exactly_once() {
        let f = facilities();
        let t = task(&f, Some(Duration::from_millis(200)), |_| Ok(3));
        let (tx, rx) = mpsc::channel();

        t.complete(Some(Box::new(move |o: Outcome<u32>| {
            let _ = tx.send(o);
        })));

        let out = rx.recv_timeout(Duration::from_secs(2)).expect("delivered");
        assert_eq!(out.into_value(), Some(3));

        thread::sleep(Duration::from_millis(300));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_interrupted_operation_delivers_nothing() {
        let f = facilities();
        let t = task(&f, None, sleepy(2_000, 1));
        let (tx, rx) = mpsc::channel::<Outcome<u32>>();

        let handle = t.complete(Some(Box::new(move |o: Outcome<u32>| {
            let _ = tx.send(o);
        })));
        thread::sleep(Duration::from_millis(20));
        assert!(handle.cancel());

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(handle.is_settled());
    }

    #[test]
    fn test_task_cancel_stops_runs() {
        let f = facilities();
        let t = task(&f, None, sleepy(2_000, 1));
        let (tx, rx) = mpsc::channel::<Outcome<u32>>();

        t.complete(Some(Box::new(move |o: Outcome<u32>| {
            let _ = tx.send(o);
        })));
        thread::sleep(Duration::from_millis(20));
        t.cancel();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(t.block().is_cancelled());
    }

    #[test]
    fn test_complete_publishes_lifecycle_events() {
        let f = facilities();
        let mut rx = f.bus().subscribe();
        let t = task(&f, None, |_| Ok(1));
        let (tx, done) = mpsc::channel();

        t.complete(Some(Box::new(move |_: Outcome<u32>| {
            let _ = tx.send(());
        })));
        done.recv_timeout(Duration::from_secs(2)).expect("delivered");

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut kinds = Vec::new();
        while kinds.len() < 2 && Instant::now() < deadline {
            match rx.try_recv() {
                Ok(ev) => {
                    assert_eq!(ev.id, Some(t.id()));
                    assert_eq!(ev.task.as_deref(), Some("basic"));
                    kinds.push(ev.kind);
                }
                Err(_) => thread::sleep(Duration::from_millis(2)),
            }
        }
        assert_eq!(kinds, vec![EventKind::TaskStarting, EventKind::TaskCompleted]);
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let f = facilities();
        let t = task(&f, Some(Duration::ZERO), |_| Ok(1));
        assert_eq!(t.timeout(), None);
    }
}
