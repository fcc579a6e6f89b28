//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing a throttle. Each subscriber
//! is driven by a dedicated worker task fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block admission or other subscribers.
//! - If a subscriber's queue overflows, events for that subscriber are **dropped**
//!   and the other subscribers receive `SubscriberOverflow`.
//! - A panic in `on_event` is caught; the other subscribers receive `SubscriberPanicked`.

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
