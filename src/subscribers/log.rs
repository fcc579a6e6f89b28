//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//!
//! ## Example output
//! ```text
//! [admitted] throttle="fs-open" call=1 active=1
//! [queued] throttle="fs-open" call=2 pending=1
//! [dequeued] throttle="fs-open" call=2 active=1 pending=0
//! [settled] throttle="fs-open" call=1
//! [failed] throttle="fs-open" call=2 err="operation_failed"
//! [subscriber] throttle="fs-open" call=2 reason="subscriber 'metrics' panicked: boom"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

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
        let throttle = e.throttle.as_deref().unwrap_or("-");
        let call = e.call.unwrap_or_default();
        match e.kind {
            EventKind::CallAdmitted => {
                println!("[admitted] throttle={throttle:?} call={call} active={:?}", e.active);
            }
            EventKind::CallQueued => {
                println!("[queued] throttle={throttle:?} call={call} pending={:?}", e.pending);
            }
            EventKind::CallDequeued => {
                println!(
                    "[dequeued] throttle={throttle:?} call={call} active={:?} pending={:?}",
                    e.active, e.pending
                );
            }
            EventKind::CallSettled => {
                println!("[settled] throttle={throttle:?} call={call}");
            }
            EventKind::CallFailed => {
                println!(
                    "[failed] throttle={throttle:?} call={call} err={:?}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::EventsLagged => {
                println!(
                    "[lagged] throttle={throttle:?} reason={:?}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber] throttle={throttle:?} call={call} reason={:?}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
