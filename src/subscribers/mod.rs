//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] that
//! fans throttle events out to every registered subscriber.
//!
//! ## Architecture
//! ```text
//! Admission ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                        ├──► [queue S1] ─► worker ─► on_event()
//!                                                        └──► [queue SN] ─► worker ─► on_event()
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use throttle_queue::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct QueueDepth;
//!
//! #[async_trait]
//! impl Subscribe for QueueDepth {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::CallQueued {
//!             // record event.pending
//!         }
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
