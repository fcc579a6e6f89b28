//! # Operation abstraction.
//!
//! An [`Operation`] is invoked once per throttled call. It receives the call's
//! arguments by value and returns a [`BoxDeferred`]: an owned future that settles
//! with the operation's value or a [`ThrottleError`].
//!
//! Operations taking several arguments use a tuple for `A`.
//!
//! The returned future must not borrow `self`: admitted calls are driven on
//! their own tokio task.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ThrottleError;

/// Boxed future returned by [`Operation::invoke`].
pub type BoxDeferred<T, E> = Pin<Box<dyn Future<Output = Result<T, ThrottleError<E>>> + Send + 'static>>;

/// Shared handle to an operation.
pub type OperationRef<A, T, E> = Arc<dyn Operation<A, Output = T, Error = E>>;

/// # Asynchronous operation with arguments `A`.
///
/// # Example
/// ```
/// use throttle_queue::{BoxDeferred, Operation, ThrottleError};
///
/// struct Double;
///
/// impl Operation<u32> for Double {
///     type Output = u32;
///     type Error = std::convert::Infallible;
///
///     fn invoke(&self, n: u32) -> BoxDeferred<u32, Self::Error> {
///         Box::pin(async move { Ok::<_, ThrottleError<_>>(n * 2) })
///     }
/// }
/// ```
pub trait Operation<A>: Send + Sync + 'static {
    /// Value the operation resolves with.
    type Output: Send + 'static;
    /// Error the operation fails with.
    type Error: Send + 'static;

    /// Starts one invocation.
    fn invoke(&self, args: A) -> BoxDeferred<Self::Output, Self::Error>;
}
