//! # Events emitted by the admission controller.
//!
//! One event per state transition of a call:
//!
//! ```text
//! ARRIVED ──► CallAdmitted ──────────────────► RUNNING ──► CallSettled | CallFailed
//!    └──────► CallQueued ──► CallDequeued ──► RUNNING
//! ```
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use throttle_queue::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CallQueued)
//!     .with_throttle("fs-open")
//!     .with_call(7)
//!     .with_pending(3);
//!
//! assert_eq!(ev.kind, EventKind::CallQueued);
//! assert_eq!(ev.call, Some(7));
//! assert_eq!(ev.pending, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of throttle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Call started immediately on arrival.
    ///
    /// Sets: `call`, `active` (after increment).
    CallAdmitted,

    /// Call arrived with the ceiling reached and was queued.
    ///
    /// Sets: `call`, `pending` (after enqueue).
    CallQueued,

    /// Queued call was released by the drain step.
    ///
    /// Sets: `call`, `active` (after increment), `pending` (after dequeue).
    CallDequeued,

    /// Call resolved successfully.
    ///
    /// Sets: `call`.
    CallSettled,

    /// Call failed.
    ///
    /// Sets: `call`, `reason` (error label).
    CallFailed,

    /// Event listener fell behind and skipped events.
    ///
    /// Sets: `reason`.
    EventsLagged,

    /// A subscriber panicked while handling an event.
    ///
    /// Delivered to the other subscribers. Sets: `reason`, plus `throttle`
    /// and `call` copied from the event being handled.
    SubscriberPanicked,

    /// A subscriber's queue was full and an event was dropped for it.
    ///
    /// Delivered to the other subscribers. Sets: `reason`, plus `throttle`
    /// and `call` copied from the dropped event.
    SubscriberOverflow,
}

/// Throttle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the throttle, if one was given.
    pub throttle: Option<Arc<str>>,
    /// Per-throttle call id (starting from 1).
    pub call: Option<u64>,
    /// Running calls after the transition.
    pub active: Option<usize>,
    /// Queued calls after the transition.
    pub pending: Option<usize>,
    /// Human-readable reason (error label, lag details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            throttle: None,
            call: None,
            active: None,
            pending: None,
            reason: None,
        }
    }

    /// Attaches a throttle name.
    #[inline]
    pub fn with_throttle(mut self, name: impl Into<Arc<str>>) -> Self {
        self.throttle = Some(name.into());
        self
    }

    /// Attaches a call id.
    #[inline]
    pub fn with_call(mut self, id: u64) -> Self {
        self.call = Some(id);
        self
    }

    /// Attaches the running-call count.
    #[inline]
    pub fn with_active(mut self, n: usize) -> Self {
        self.active = Some(n);
        self
    }

    /// Attaches the queued-call count.
    #[inline]
    pub fn with_pending(mut self, n: usize) -> Self {
        self.pending = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for `CallSettled` and `CallFailed`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::CallSettled | EventKind::CallFailed)
    }

    /// True for events raised by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_increases_across_events() {
        let a = Event::new(EventKind::CallAdmitted);
        let b = Event::new(EventKind::CallSettled);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_classification() {
        assert!(Event::new(EventKind::CallSettled).is_terminal());
        assert!(Event::new(EventKind::CallFailed).is_terminal());
        assert!(!Event::new(EventKind::CallDequeued).is_terminal());

        assert!(Event::new(EventKind::SubscriberPanicked).is_subscriber_fault());
        assert!(Event::new(EventKind::SubscriberOverflow).is_subscriber_fault());
        assert!(!Event::new(EventKind::EventsLagged).is_subscriber_fault());
    }
}
