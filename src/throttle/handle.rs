use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::ThrottleError;

/// Deferred result of one throttled call.
///
/// Resolves with the operation's value or fails with its error once the call
/// has run. Dropping the handle does not cancel the call: queued calls still
/// run in order and running calls run to completion.
#[must_use = "the result of a throttled call is only observable through its handle"]
#[derive(Debug)]
pub struct CallHandle<T, E> {
    id: u64,
    rx: oneshot::Receiver<Result<T, ThrottleError<E>>>,
}

impl<T, E> CallHandle<T, E> {
    pub(super) fn new(id: u64, rx: oneshot::Receiver<Result<T, ThrottleError<E>>>) -> Self {
        Self { id, rx }
    }

    /// Per-throttle call id, in arrival order (starting from 1).
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T, E> Future for CallHandle<T, E> {
    type Output = Result<T, ThrottleError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_| Err(ThrottleError::Abandoned)))
    }
}
