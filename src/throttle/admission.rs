//! # Admission control
//!
//! Decides, for every arriving call and every completion, whether work runs now
//! or waits in the FIFO queue.
//!
//! ## State machine (per call)
//! ```text
//! ARRIVED ──(active < max, queue empty)──► RUNNING ──► DONE | FAILED
//!    │                                        ▲            │
//!    └──(otherwise)──► QUEUED ──(drain)───────┘            ▼
//!                                       give back: active -= 1, reply, drain
//! ```
//!
//! ## Invariants
//! - `active <= max` at every point: the capacity check and the increment
//!   happen under one lock.
//! - Release order is arrival order. An arrival never overtakes queued calls,
//!   even when it finds free capacity.
//! - Drain is a loop owned by one releasing thread at a time (`draining`).
//!   Releases that happen meanwhile, including releases triggered while
//!   starting calls, only give back capacity; the owner picks it up on its
//!   next pass.
//! - A settled call gives its capacity back before its caller is answered and
//!   drains after that, so the caller never waits on a drain pass.
//! - No user code and no event publishing runs under the lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::{Bus, Event, EventKind};
use crate::queue::Queue;

use super::pending::PendingCall;
use super::slot::Slot;

/// Capacity bookkeeping of one throttle.
pub(super) struct Admission {
    max: usize,
    name: Option<Arc<str>>,
    bus: Option<Bus>,
    next_id: AtomicU64,
    state: Mutex<AdmissionState>,
}

struct AdmissionState {
    active: usize,
    pending: Queue<PendingCall>,
    draining: bool,
}

impl Admission {
    /// Creates an idle controller; `max` must already be clamped to at least 1.
    pub fn new(max: usize, name: Option<Arc<str>>, bus: Option<Bus>) -> Self {
        Self {
            max,
            name,
            bus,
            next_id: AtomicU64::new(1),
            state: Mutex::new(AdmissionState {
                active: 0,
                pending: Queue::new(),
                draining: false,
            }),
        }
    }

    pub fn next_call_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn active(&self) -> usize {
        self.lock().active
    }

    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Starts `call` now if capacity allows, otherwise queues it.
    pub fn admit(self: &Arc<Self>, call: PendingCall) {
        let id = call.id();
        let mut st = self.lock();

        if st.pending.is_empty() && st.active < self.max {
            st.active += 1;
            let active = st.active;
            let ev = self.event(|| {
                Event::new(EventKind::CallAdmitted)
                    .with_call(id)
                    .with_active(active)
            });
            drop(st);

            self.emit(ev);
            call.start(Slot::new(Arc::clone(self), id));
        } else {
            let pending = st.pending.enqueue(call);
            let ev = self.event(|| {
                Event::new(EventKind::CallQueued)
                    .with_call(id)
                    .with_pending(pending)
            });
            drop(st);

            self.emit(ev);
        }
    }

    /// Gives back one unit of capacity and drains the queue.
    pub fn release(self: &Arc<Self>) {
        self.give_back();
        self.drain();
    }

    /// Gives back one unit of capacity without starting anything.
    ///
    /// Must be followed by [`drain`](Self::drain), or queued calls may stall.
    pub fn give_back(&self) {
        let mut st = self.lock();
        st.active = st.active.saturating_sub(1);
    }

    /// Starts queued calls, oldest first, while capacity allows.
    pub fn drain(self: &Arc<Self>) {
        let mut st = self.lock();
        if st.draining {
            return;
        }
        st.draining = true;

        loop {
            let mut ready = Vec::new();
            let mut events = Vec::new();

            while st.active < self.max {
                let Some(call) = st.pending.dequeue() else {
                    break;
                };
                st.active += 1;

                let (id, active, pending) = (call.id(), st.active, st.pending.len());
                events.push(self.event(|| {
                    Event::new(EventKind::CallDequeued)
                        .with_call(id)
                        .with_active(active)
                        .with_pending(pending)
                }));
                ready.push(call);
            }

            if ready.is_empty() {
                st.draining = false;
                return;
            }
            drop(st);

            for ev in events {
                self.emit(ev);
            }
            for call in ready {
                let id = call.id();
                call.start(Slot::new(Arc::clone(self), id));
            }

            st = self.lock();
        }
    }

    /// Publishes an event built by `f`; skipped entirely without a bus.
    pub fn publish(&self, f: impl FnOnce() -> Event) {
        let ev = self.event(f);
        self.emit(ev);
    }

    /// Builds an event (assigning its sequence number) only when someone listens.
    fn event(&self, f: impl FnOnce() -> Event) -> Option<Event> {
        self.bus.as_ref()?;
        let ev = f();
        Some(match &self.name {
            Some(name) => ev.with_throttle(Arc::clone(name)),
            None => ev,
        })
    }

    fn emit(&self, ev: Option<Event>) {
        if let (Some(bus), Some(ev)) = (&self.bus, ev) {
            bus.publish(ev);
        }
    }

    // Nothing panics while holding the lock, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, AdmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
