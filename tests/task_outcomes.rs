//! End-to-end task behaviour through the public API.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use taskloom::{
    CancellationToken, Config, Facilities, Outcome, TaskError, TaskKind, TaskRef, TaskRegistry,
};

fn registry() -> TaskRegistry {
    TaskRegistry::new(Facilities::new(Config::default()).expect("facilities"))
}

fn sleeping(registry: &TaskRegistry, sleep: Duration, timeout: Duration) -> TaskRef<&'static str> {
    registry
        .task_builder::<&'static str>(TaskKind::BASIC)
        .expect("basic")
        .operation(move |ctx: &CancellationToken| {
            let deadline = Instant::now() + sleep;
            while Instant::now() < deadline {
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                thread::sleep(Duration::from_millis(1));
            }
            Ok("slept")
        })
        .timeout(timeout)
        .build()
        .expect("build")
}

fn complete_and_wait<R: Send + 'static>(task: &TaskRef<R>) -> (Outcome<R>, Duration) {
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();
    task.on_complete(move |outcome| {
        let _ = tx.send((outcome, started.elapsed()));
    });
    rx.recv_timeout(Duration::from_secs(5)).expect("delivered")
}

#[test]
fn success_within_timeout_delivers_value_on_both_paths() {
    let r = registry();
    let task = sleeping(&r, Duration::from_millis(5), Duration::from_millis(500));

    let (outcome, _) = complete_and_wait(&task);
    assert_eq!(outcome.value(), Some(&"slept"));
    assert!(outcome.error().is_none());
    assert!(outcome.elapsed().is_some());

    let outcome = task.block();
    assert_eq!(outcome.value(), Some(&"slept"));
    assert!(outcome.error().is_none());
}

#[test]
fn fault_is_carried_on_both_paths() {
    let r = registry();
    let task = r
        .task_builder::<u8>(TaskKind::BASIC)
        .expect("basic")
        .operation(|_| Err(TaskError::fail("disk on fire")))
        .build()
        .expect("build");

    let (outcome, _) = complete_and_wait(&task);
    assert_eq!(outcome.error(), Some(&TaskError::fail("disk on fire")));
    assert!(outcome.value().is_none());
    assert!(outcome.elapsed().is_none());

    let outcome = task.block();
    assert_eq!(outcome.error(), Some(&TaskError::fail("disk on fire")));
    assert!(task.block_ignoring_result_or_throw().is_err());
}

#[test]
fn timeout_wins_against_slow_operation() {
    let r = registry();
    let timeout = Duration::from_millis(50);
    let task = sleeping(&r, Duration::from_millis(400), timeout);

    let (outcome, waited) = complete_and_wait(&task);
    assert_eq!(outcome, Outcome::Failed(TaskError::Timeout { timeout }));
    assert!(waited >= Duration::from_millis(45), "delivered after {waited:?}");
    assert!(waited < Duration::from_millis(350), "delivered after {waited:?}");
    assert!(task.done());
}

#[test]
fn done_flips_after_each_path() {
    let r = registry();

    let ok = sleeping(&r, Duration::ZERO, Duration::from_secs(1));
    assert!(!ok.done());
    let _ = complete_and_wait(&ok);
    assert!(ok.done());

    let failing = r
        .task_builder::<()>(TaskKind::BASIC)
        .expect("basic")
        .operation(|_| Err(TaskError::fail("no")))
        .build()
        .expect("build");
    assert!(!failing.done());
    let _ = failing.block();
    assert!(failing.done());

    let slow = sleeping(&r, Duration::from_secs(1), Duration::from_millis(10));
    assert!(!slow.done());
    let _ = complete_and_wait(&slow);
    assert!(slow.done());
}

#[test]
fn lookup_fault_for_unknown_kind() {
    let r = registry();
    let Err(err) = r.task_builder::<()>("nope") else {
        panic!("unknown kind must not resolve");
    };
    assert_eq!(err.as_label(), "runtime_unknown_task_impl");
}
