//! # Runtime events emitted by tasks, timers and the registry.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Task events**: execution flow of one `complete`/`block` call
//! - **Timer events**: start, firing, stop
//! - **Registry events**: task implementation (de)registration
//! - **Subscriber events**: delivery problems inside the [`SubscriberSet`](crate::SubscriberSet)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! kind and id, reasons, and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskloom::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("basic")
//!     .with_id(3)
//!     .with_reason("boom")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("basic"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Task events ===
    /// An operation is about to run (async or blocking).
    ///
    /// Sets:
    /// - `task`: task kind
    /// - `id`: task id
    /// - `timeout_ms`: configured timeout, if any
    TaskStarting,

    /// The operation returned a value and its outcome was delivered.
    ///
    /// Sets:
    /// - `task`, `id`
    /// - `elapsed_ms`: measured execution time
    TaskCompleted,

    /// The operation raised a fault.
    ///
    /// Sets:
    /// - `task`, `id`
    /// - `reason`: failure message
    TaskFailed,

    /// The timeout fired before the operation finished.
    ///
    /// Sets:
    /// - `task`, `id`
    /// - `timeout_ms`: configured timeout
    TimeoutHit,

    /// The operation was interrupted; nothing was delivered.
    ///
    /// Sets:
    /// - `task`, `id`
    TaskCancelled,

    // === Timer events ===
    /// A timer entered its active state.
    ///
    /// Sets:
    /// - `task`: timer variant (`after` / `periodic`)
    /// - `delay_ms`: first delay
    TimerStarted,

    /// A timer ran its operation.
    ///
    /// Sets:
    /// - `task`: timer variant
    TimerFired,

    /// A timer went back to idle.
    ///
    /// Sets:
    /// - `task`: timer variant
    TimerStopped,

    // === Registry events ===
    /// A task implementation was registered (or replaced).
    ///
    /// Sets:
    /// - `task`: task kind
    ImplRegistered,

    /// A task implementation was removed.
    ///
    /// Sets:
    /// - `task`: task kind
    ImplDeregistered,

    /// All task implementations were dropped.
    RegistryCleared,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task kind, timer variant or subscriber name.
    pub task: Option<Arc<str>>,
    /// Task instance id.
    pub id: Option<u64>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Timer delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Measured execution time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            id: None,
            timeout_ms: None,
            delay_ms: None,
            elapsed_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task kind / timer variant / subscriber name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task instance id.
    #[inline]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a timer delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a measured execution time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_are_compacted() {
        let ev = Event::new(EventKind::TimeoutHit)
            .with_timeout(Duration::from_millis(1500))
            .with_elapsed(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(1500));
        assert_eq!(ev.elapsed_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));

        let ev = Event::subscriber_panicked("audit", "oops".into());
        assert!(ev.is_subscriber_panic());
        assert_eq!(ev.task.as_deref(), Some("audit"));
    }
}
