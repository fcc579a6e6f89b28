//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - A panicking subscriber does not affect the others. The panic is reported
//!   to them as [`EventKind::SubscriberPanicked`].
//! - An event dropped for a full subscriber queue is reported to the others as
//!   [`EventKind::SubscriberOverflow`].
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow.
//! - Faults raised while handling a fault report are only written to stderr.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Event, EventKind};

use super::Subscribe;

/// Sending side of one subscriber's queue.
struct Outlet {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Weak view of every outlet, held by workers so their peers can still close.
type Peers = Arc<[mpsc::WeakSender<Arc<Event>>]>;

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    outlets: Vec<Outlet>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let (outlets, inlets): (Vec<_>, Vec<_>) = subs
            .iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
                (Outlet { name: sub.name(), tx }, rx)
            })
            .unzip();

        let peers: Peers = outlets.iter().map(|o| o.tx.downgrade()).collect();
        let workers = subs
            .into_iter()
            .zip(inlets)
            .enumerate()
            .map(|(idx, (sub, rx))| tokio::spawn(run_worker(idx, sub, rx, Arc::clone(&peers))))
            .collect();

        Self { outlets, workers }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for (idx, outlet) in self.outlets.iter().enumerate() {
            match outlet.tx.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let reason = format!("subscriber '{}' dropped event: queue full", outlet.name);
                    eprintln!("[throttle-queue] {reason}");
                    if !ev.is_subscriber_fault() {
                        let fault = fault(EventKind::SubscriberOverflow, &ev, reason);
                        for (i, peer) in self.outlets.iter().enumerate() {
                            if i != idx {
                                let _ = peer.tx.try_send(Arc::clone(&fault));
                            }
                        }
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    eprintln!(
                        "[throttle-queue] subscriber '{}' dropped event: worker closed",
                        outlet.name
                    );
                }
            }
        }
    }

    /// Forwards bus events until the bus closes, then shuts the set down.
    ///
    /// Lag is reported to subscribers as an [`EventKind::EventsLagged`] event.
    pub(crate) fn spawn_listener(self, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => self.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => self.emit(
                        &Event::new(EventKind::EventsLagged)
                            .with_reason(format!("listener skipped {skipped} events")),
                    ),
                    Err(RecvError::Closed) => break,
                }
            }
            self.shutdown().await;
        })
    }

    /// Closes every queue and waits until the workers have handled what was queued.
    pub async fn shutdown(self) {
        drop(self.outlets);
        join_all(self.workers).await;
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outlets.len()
    }
}

/// Feeds one subscriber from its queue, reporting its panics to the peers.
async fn run_worker(
    idx: usize,
    sub: Arc<dyn Subscribe>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    peers: Peers,
) {
    while let Some(ev) = rx.recv().await {
        let Err(payload) = AssertUnwindSafe(sub.on_event(ev.as_ref())).catch_unwind().await else {
            continue;
        };
        let reason = format!(
            "subscriber '{}' panicked: {}",
            sub.name(),
            panic_message(payload.as_ref())
        );
        eprintln!("[throttle-queue] {reason}");

        // A peer that panics on fault reports must not bounce them back forever.
        if ev.is_subscriber_fault() {
            continue;
        }
        let fault = fault(EventKind::SubscriberPanicked, &ev, reason);
        for (i, peer) in peers.iter().enumerate() {
            if i == idx {
                continue;
            }
            if let Some(tx) = peer.upgrade() {
                let _ = tx.try_send(Arc::clone(&fault));
            }
        }
    }
}

/// Builds a fault report about `cause`, keeping its throttle and call.
fn fault(kind: EventKind, cause: &Event, reason: String) -> Arc<Event> {
    let mut ev = Event::new(kind).with_reason(reason);
    ev.throttle = cause.throttle.clone();
    ev.call = cause.call;
    Arc::new(ev)
}
