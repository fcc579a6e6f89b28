use std::sync::Arc;

use crate::{
    config::ThrottleConfig,
    events::Bus,
    operations::{Operation, OperationRef},
    subscribers::{Subscribe, SubscriberSet},
};

use super::{admission::Admission, core::Throttle};

/// Builder for constructing a [`Throttle`] with optional name and subscribers.
pub struct ThrottleBuilder {
    cfg: ThrottleConfig,
    name: Option<Arc<str>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ThrottleBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ThrottleConfig) -> Self {
        Self {
            cfg,
            name: None,
            subscribers: Vec::new(),
        }
    }

    /// Names the throttle; the name is attached to every event.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive one event per admission transition through
    /// dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Wraps `op` and returns the throttle.
    ///
    /// With subscribers, this spawns the event listener and must be called
    /// from within a tokio runtime. The listener exits once the throttle and
    /// all of its calls are gone.
    pub fn build<A, O>(self, op: O) -> Throttle<A, O::Output, O::Error>
    where
        A: Send + 'static,
        O: Operation<A>,
    {
        let bus = if self.subscribers.is_empty() {
            None
        } else {
            let bus = Bus::new(self.cfg.bus_capacity_clamped());
            SubscriberSet::new(self.subscribers).spawn_listener(bus.subscribe());
            Some(bus)
        };

        let admission = Admission::new(self.cfg.max_concurrent_clamped(), self.name, bus);
        let op: OperationRef<A, O::Output, O::Error> = Arc::new(op);
        Throttle::from_parts(op, Arc::new(admission))
    }
}
