//! # Throttle configuration.
//!
//! [`ThrottleConfig`] is fixed once a throttle is built; there is no way to
//! resize the ceiling of a running controller.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → clamped to 1 (a zero ceiling would never admit anything)
//! - `bus_capacity = 0` → clamped to 1

/// Default ceiling of simultaneously running calls.
pub const DEFAULT_MAX_CONCURRENT: usize = 100;

/// Configuration of one throttled operation.
///
/// ## Field semantics
/// - `max_concurrent`: ceiling of in-flight invocations (min 1)
/// - `bus_capacity`: event bus ring buffer size (min 1; only used with subscribers)
#[derive(Clone, Debug)]
pub struct ThrottleConfig {
    /// Maximum number of invocations running at the same time.
    ///
    /// Calls beyond this wait in FIFO order.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow listeners that lag behind more than `bus_capacity` events skip older ones.
    pub bus_capacity: usize,
}

impl ThrottleConfig {
    /// Default configuration with the given ceiling.
    #[must_use]
    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Self::default()
        }
    }

    /// Returns the ceiling clamped to a minimum of 1.
    #[inline]
    pub fn max_concurrent_clamped(&self) -> usize {
        self.max_concurrent.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ThrottleConfig {
    /// Default configuration:
    ///
    /// - `max_concurrent = 100`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            bus_capacity: 1024,
        }
    }
}
