//! # throttle-queue
//!
//! **throttle-queue** bounds how many invocations of an async operation run at
//! the same time. Calls beyond the ceiling wait in a FIFO queue and are started
//! in arrival order as running calls settle. The caller just awaits a handle.
//!
//! The typical use is protecting a resource with a hard concurrency limit (open
//! file handles, connection slots) from an unbounded burst of requests.
//!
//! ## Architecture
//! ```text
//!   caller ── call(args) ──► Throttle
//!                              │
//!                              ▼
//!                        Admission (Mutex)
//!                    ┌─────────┴───────────┐
//!    active < max && queue empty        otherwise
//!                    │                     │
//!                    ▼                     ▼
//!           spawn run_call(Slot)     Queue<PendingCall>
//!                    │                     ▲
//!                    ▼                     │ drain (loop)
//!            op.invoke(args).await         │
//!                    │                     │
//!                    └── Slot dropped ─────┘  (active -= 1, start next)
//!                    │
//!                    ▼
//!        CallHandle resolves with the operation's result
//! ```
//!
//! ## Guarantees
//! - At most `max_concurrent` invocations run at once.
//! - Queued calls start in strict arrival order.
//! - Every call settles as long as running operations settle; failures, panics
//!   and misuse of one call never block the queue.
//! - Each throttle has its own queue and counters.
//!
//! Calls cannot be cancelled: dropping a [`CallHandle`] only discards the result.
//!
//! ## Features
//! | Area              | Description                                             | Key types / traits                      |
//! |-------------------|---------------------------------------------------------|-----------------------------------------|
//! | **Throttling**    | FIFO admission with a fixed ceiling.                    | [`Throttle`], [`CallHandle`], [`wrap`]  |
//! | **Operations**    | Future-returning and callback-style operations.         | [`Operation`], [`OperationFn`], [`adapt`] |
//! | **Queue**         | Amortized O(1) two-buffer FIFO.                         | [`Queue`]                               |
//! | **Errors**        | Operation errors passed through untouched.              | [`ThrottleError`]                       |
//! | **Events**        | One event per admission transition.                     | [`Subscribe`], [`Event`]                |
//! | **Configuration** | Ceiling and bus capacity.                               | [`ThrottleConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let read = throttle_queue::wrap(
//!         |n: u64| async move {
//!             tokio::time::sleep(Duration::from_millis(n)).await;
//!             Ok::<_, std::io::Error>(n)
//!         },
//!         2,
//!     );
//!
//!     let calls: Vec<_> = (1..=5).map(|n| read.call(n)).collect();
//!     for (n, call) in (1..=5).zip(calls) {
//!         assert_eq!(call.await.ok(), Some(n));
//!     }
//! }
//! ```

mod config;
mod error;
mod events;
mod operations;
mod queue;
mod subscribers;
mod throttle;

// ---- Public re-exports ----

pub use config::{DEFAULT_MAX_CONCURRENT, ThrottleConfig};
pub use error::ThrottleError;
pub use events::{Event, EventKind};
pub use operations::{
    BoxDeferred, Callback, CallbackFn, Operation, OperationFn, OperationRef, Outcome, adapt,
};
pub use queue::Queue;
pub use subscribers::{Subscribe, SubscriberSet};
pub use throttle::{CallHandle, Throttle, ThrottleBuilder};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

use std::future::Future;

/// Wraps a future-returning operation with a concurrency ceiling.
///
/// `max_concurrent = 0` is treated as 1. See [`DEFAULT_MAX_CONCURRENT`] for the
/// conventional default.
pub fn wrap<A, F, Fut, T, E>(f: F, max_concurrent: usize) -> Throttle<A, T, E>
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    Throttle::builder(ThrottleConfig::with_max_concurrent(max_concurrent))
        .build(OperationFn::new(f))
}

/// Wraps a callback-style operation with a concurrency ceiling.
///
/// `f` receives the call's arguments and a [`Callback`] to complete with
/// `(error, ...results)`; see [`adapt`] for how that maps to an [`Outcome`].
///
/// ## Example
/// ```rust
/// use throttle_queue::{Callback, Outcome};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let stat = throttle_queue::wrap_callback(
///     |path: &'static str, cb: Callback<usize, String>| {
///         if path.is_empty() {
///             cb.fail("empty path".to_string());
///         } else {
///             cb.ok(path.len());
///         }
///     },
///     4,
/// );
///
/// assert_eq!(stat.call("/tmp").await.ok(), Some(Outcome::Single(4)));
/// assert!(stat.call("").await.is_err());
/// # }
/// ```
pub fn wrap_callback<A, F, V, E>(f: F, max_concurrent: usize) -> Throttle<A, Outcome<V>, E>
where
    A: Send + 'static,
    F: Fn(A, Callback<V, E>) + Send + Sync + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    Throttle::builder(ThrottleConfig::with_max_concurrent(max_concurrent)).build(adapt(f))
}
