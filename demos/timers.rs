//! # Example: timers
//!
//! One-shot and periodic timers, on the calling thread and on the delayer.
//!
//! ## Flow
//! ```text
//! after(200ms).start()                 ─► blocks, fires once, returns
//! periodic(100ms).on(&f).start()       ─► returns at once; delayer fires every 100ms
//! after(350ms).on(&f).performs(stop)   ─► stops the periodic timer from the delayer
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example timers
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use taskloom::timer::{self, Timer};
use taskloom::{Config, Facilities};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let facilities = Facilities::new(Config::default())?;
    let started = Instant::now();

    // 1. Calling-thread one-shot
    timer::after()
        .delay(Duration::from_millis(200))
        .performs(move || println!("after: fired at {:?}", started.elapsed()))
        .start()?;

    // 2. Background periodic
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let ticker = timer::periodic()
        .initial_delay(Duration::ZERO)
        .interval(Duration::from_millis(100))
        .performs(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            println!("periodic: tick {n} at {:?}", started.elapsed());
        })
        .on(&facilities);
    ticker.start()?;

    // 3. Background one-shot stopping the periodic timer
    let target = ticker.clone();
    timer::after()
        .delay(Duration::from_millis(350))
        .performs(move || {
            println!("after: stopping periodic (was active: {})", target.stop());
        })
        .on(&facilities)
        .start()?;

    thread::sleep(Duration::from_millis(600));
    println!(
        "ticks={} periodic active={}",
        ticks.load(Ordering::SeqCst),
        ticker.is_active()
    );
    Ok(())
}
