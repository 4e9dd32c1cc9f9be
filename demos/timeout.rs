//! # Example: timeout
//!
//! Races a slow operation against its timeout and logs every event.
//!
//! Demonstrates how to:
//! - Build [`Facilities`] with the built-in [`LogWriter`] subscriber.
//! - Build tasks through a [`TaskRegistry`] with a timeout.
//! - Complete them asynchronously and inspect the [`Outcome`].
//!
//! ## Flow
//! ```text
//! task_builder("basic").operation(..).timeout(100ms).build()
//!     ├─► fast.complete(cb) ─► pool: Ok(1)       ─► cb(Completed), timer disarmed
//!     └─► slow.complete(cb) ─► delayer: 100ms    ─► cb(Failed(Timeout)), token cancelled
//!                              pool: sees cancel ─► Err(Canceled), nothing delivered
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example timeout --features logging
//! ```

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use taskloom::{
    Config, Facilities, LogWriter, Outcome, Subscribe, TaskError, TaskKind, TaskRegistry,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Facilities with a logging subscriber
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let facilities = Facilities::builder(Config::default())
        .with_subscribers(subs)
        .build()?;
    let registry = TaskRegistry::new(facilities);

    // 2. One builder, two tasks with different speeds
    let fast = registry
        .task_builder::<u32>(TaskKind::BASIC)?
        .operation(|_ctx| Ok(1))
        .timeout(Duration::from_millis(100))
        .build()?;

    let slow = registry
        .task_builder::<u32>(TaskKind::BASIC)?
        .operation(|ctx| {
            for _ in 0..100 {
                if ctx.is_cancelled() {
                    return Err(TaskError::Canceled);
                }
                thread::sleep(Duration::from_millis(10));
            }
            Ok(2)
        })
        .timeout(Duration::from_millis(100))
        .build()?;

    // 3. Complete both and wait for the outcomes
    let (tx, rx) = mpsc::channel::<(&'static str, Outcome<u32>)>();
    for (name, task) in [("fast", &fast), ("slow", &slow)] {
        let tx = tx.clone();
        task.on_complete(move |outcome| {
            let _ = tx.send((name, outcome));
        });
    }
    drop(tx);

    for (name, outcome) in rx.iter() {
        match outcome {
            Outcome::Completed { value, elapsed } => {
                println!("{name}: value={value} elapsed={elapsed:?}");
            }
            Outcome::Failed(err) => println!("{name}: failed: {err}"),
            Outcome::Cancelled => println!("{name}: cancelled"),
        }
    }

    // Give the subscriber a moment to drain.
    thread::sleep(Duration::from_millis(200));
    println!("done: fast={} slow={}", fast.done(), slow.done());
    Ok(())
}
