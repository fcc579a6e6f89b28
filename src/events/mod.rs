//! # Throttle events.
//!
//! - [`Event`] / [`EventKind`] describe one admission-control transition
//! - [`Bus`] broadcasts events from the controller to the subscriber listener

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
