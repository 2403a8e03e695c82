//! Keyed single-flight. Callers with the same key share one in-flight
//! operation and observe its single outcome. The operation runs as its own
//! task, so it completes and clears its slot even when every caller has been
//! dropped; the next call after that starts a fresh operation.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, warn};

/// Shared handle on one flight. Resolves to `None` if the task panicked or
/// was cancelled by runtime shutdown.
pub type Ticket<V> = Shared<BoxFuture<'static, Option<V>>>;

struct Inflight<V> {
    id: u64,
    key: u64,
    ticket: Ticket<V>,
}

struct Slot<V> {
    next_id: u64,
    inflight: Option<Inflight<V>>,
}

pub struct SingleFlight<V> {
    slot: Arc<Mutex<Slot<V>>>,
}

impl<V> Default for SingleFlight<V> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                next_id: 0,
                inflight: None,
            })),
        }
    }
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the flight in progress for `key`, or spawns `start(id)` as a new
    /// one. A flight for a different key is superseded, not joined.
    ///
    /// Must be called from within a tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: u64, start: F) -> Ticket<V>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let mut slot = lock(&self.slot);

        if let Some(inflight) = slot.inflight.as_ref().filter(|inflight| inflight.key == key) {
            debug!(flight = inflight.id, key, "joining in-flight call");
            return inflight.ticket.clone();
        }

        let id = slot.next_id;
        slot.next_id += 1;

        let operation = start(id);
        let owner = Arc::clone(&self.slot);
        // the task cannot observe the slot before this function releases the lock
        let handle = tokio::spawn(async move {
            let value = operation.await;
            let mut slot = lock(&owner);
            if slot.inflight.as_ref().is_some_and(|inflight| inflight.id == id) {
                slot.inflight = None;
            }
            value
        });

        let ticket = async move {
            handle
                .await
                .map_err(|err| warn!(flight = id, error = %err, "in-flight call aborted"))
                .ok()
        }
        .boxed()
        .shared();

        slot.inflight = Some(Inflight {
            id,
            key,
            ticket: ticket.clone(),
        });
        ticket
    }

    /// True while a flight is outstanding.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        lock(&self.slot).inflight.is_some()
    }
}

fn lock<V>(slot: &Mutex<Slot<V>>) -> MutexGuard<'_, Slot<V>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
