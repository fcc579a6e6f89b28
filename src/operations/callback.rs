//! # Callback-style operations.
//!
//! Some operations report completion through a callback instead of returning a
//! future. [`adapt`] turns such a function into an [`Operation`] so it can be
//! throttled like any other.
//!
//! The callback follows the `(error, ...results)` convention:
//!
//! | Callback invoked with       | Deferred settles with        |
//! |-----------------------------|------------------------------|
//! | `(Some(e), _)`              | fails with `e`               |
//! | `(None, [])`                | [`Outcome::Empty`]           |
//! | `(None, [v])`               | [`Outcome::Single`]`(v)`     |
//! | `(None, [v1, v2, ...])`     | [`Outcome::Many`] (in order) |
//! | callback dropped, never run | [`ThrottleError::Usage`]     |
//!
//! ## Example
//! ```rust
//! use throttle_queue::{Callback, Operation, Outcome, adapt};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let op = adapt(|name: &'static str, cb: Callback<String, std::io::Error>| {
//!     cb.complete(None, vec![name.to_uppercase(), name.to_string()]);
//! });
//!
//! let out = op.invoke("ab").await.ok();
//! assert_eq!(out, Some(Outcome::Many(vec!["AB".to_string(), "ab".to_string()])));
//! # }
//! ```

use std::marker::PhantomData;

use tokio::sync::oneshot;

use crate::error::ThrottleError;
use crate::operations::operation::{BoxDeferred, Operation};

/// Values passed to a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V> {
    /// Callback was invoked with no result values.
    Empty,
    /// Callback was invoked with exactly one result value.
    Single(V),
    /// Callback was invoked with several result values, in order.
    Many(Vec<V>),
}

impl<V> Outcome<V> {
    /// Classifies a list of callback results.
    pub fn from_results(mut results: Vec<V>) -> Self {
        match results.len() {
            0 => Outcome::Empty,
            1 => results.pop().map_or(Outcome::Empty, Outcome::Single),
            _ => Outcome::Many(results),
        }
    }

    /// Returns the single value, if there is exactly one.
    pub fn single(self) -> Option<V> {
        match self {
            Outcome::Single(v) => Some(v),
            _ => None,
        }
    }

    /// Flattens the outcome back into the ordered result list.
    pub fn into_vec(self) -> Vec<V> {
        match self {
            Outcome::Empty => Vec::new(),
            Outcome::Single(v) => vec![v],
            Outcome::Many(vs) => vs,
        }
    }
}

/// Single-use completion handle passed to a callback-style operation.
///
/// Consumed by whichever completion method is called. Dropping it without
/// calling one fails the pending call with a usage error instead of leaving it
/// hanging.
#[derive(Debug)]
pub struct Callback<V, E> {
    tx: oneshot::Sender<Result<Outcome<V>, E>>,
}

impl<V, E> Callback<V, E> {
    /// Completes with the `(error, ...results)` convention.
    ///
    /// A present `err` wins over any results.
    pub fn complete(self, err: Option<E>, results: Vec<V>) {
        let settled = match err {
            Some(e) => Err(e),
            None => Ok(Outcome::from_results(results)),
        };
        // Receiver gone means the caller's task was dropped; nothing left to notify.
        let _ = self.tx.send(settled);
    }

    /// Completes successfully with one value.
    pub fn ok(self, value: V) {
        self.complete(None, vec![value]);
    }

    /// Completes successfully with no value.
    pub fn done(self) {
        self.complete(None, Vec::new());
    }

    /// Completes with an error.
    pub fn fail(self, err: E) {
        self.complete(Some(err), Vec::new());
    }
}

/// Operation adapted from a callback-style function.
///
/// Built by [`adapt`].
pub struct CallbackFn<F, V, E> {
    f: F,
    _marker: PhantomData<fn() -> (V, E)>,
}

/// Adapts `f(args, callback)` into an [`Operation`] resolving with an [`Outcome`].
///
/// `f` is called once per invocation and may complete the callback right away
/// or hand it to other work that completes it later.
pub fn adapt<A, F, V, E>(f: F) -> CallbackFn<F, V, E>
where
    F: Fn(A, Callback<V, E>) + Send + Sync + 'static,
{
    CallbackFn {
        f,
        _marker: PhantomData,
    }
}

impl<A, F, V, E> Operation<A> for CallbackFn<F, V, E>
where
    F: Fn(A, Callback<V, E>) + Send + Sync + 'static,
    V: Send + 'static,
    E: Send + 'static,
{
    type Output = Outcome<V>;
    type Error = E;

    fn invoke(&self, args: A) -> BoxDeferred<Outcome<V>, E> {
        let (tx, rx) = oneshot::channel();
        (self.f)(args, Callback { tx });

        Box::pin(async move {
            match rx.await {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(e)) => Err(ThrottleError::Operation(e)),
                Err(_) => Err(ThrottleError::usage(
                    "completion callback dropped without being invoked",
                )),
            }
        })
    }
}
