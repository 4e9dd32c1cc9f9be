//! # LogWriter - event renderer backed by `tracing`
//!
//! A minimal subscriber that renders incoming [`Event`]s as `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output
//! ```text
//! [starting] task="basic" id=3 timeout_ms=Some(50)
//! [timeout] task="basic" id=3 timeout_ms=50
//! [failed] task="basic" id=4 err="execution failed: boom"
//! [timer-fired] timer="periodic"
//! [registered] kind="basic"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;
use tracing::{info, warn};

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::TaskStarting => {
                info!("[starting] task={task:?} id={:?} timeout_ms={:?}", e.id, e.timeout_ms);
            }
            EventKind::TaskCompleted => {
                info!("[completed] task={task:?} id={:?} elapsed_ms={:?}", e.id, e.elapsed_ms);
            }
            EventKind::TaskFailed => {
                warn!("[failed] task={task:?} id={:?} err={:?}", e.id, e.reason);
            }
            EventKind::TimeoutHit => {
                warn!("[timeout] task={task:?} id={:?} timeout_ms={:?}", e.id, e.timeout_ms);
            }
            EventKind::TaskCancelled => {
                info!("[cancelled] task={task:?} id={:?}", e.id);
            }
            EventKind::TimerStarted => {
                info!("[timer-started] timer={task:?} delay_ms={:?}", e.delay_ms);
            }
            EventKind::TimerFired => {
                info!("[timer-fired] timer={task:?}");
            }
            EventKind::TimerStopped => {
                info!("[timer-stopped] timer={task:?}");
            }
            EventKind::ImplRegistered => {
                info!("[registered] kind={task:?}");
            }
            EventKind::ImplDeregistered => {
                info!("[deregistered] kind={task:?}");
            }
            EventKind::RegistryCleared => {
                info!("[registry-cleared]");
            }
            EventKind::SubscriberOverflow => {
                warn!("[subscriber-overflow] subscriber={task:?} reason={:?}", e.reason);
            }
            EventKind::SubscriberPanicked => {
                warn!(
                    "[subscriber-panicked] subscriber={task} info={}",
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
