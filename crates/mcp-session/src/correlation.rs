//! One-shot request/response correlation for server-initiated requests.
//!
//! When the protocol core needs to ask a client something (`roots/list`,
//! `sampling/createMessage`), it registers a waiter keyed by the JSON-RPC
//! request id it's about to send, then awaits the matching reply arriving
//! back through whichever transport direction the client answers on. Each
//! slot is one-shot: the first [`CorrelationTable::deliver`] call wins and
//! removes the slot, so a duplicate or late reply is reported to the caller
//! rather than silently discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Identifies one outstanding server→client request awaiting a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(u64);

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "corr-{}", self.0)
    }
}

impl CorrelationId {
    /// Parse the `corr-{n}` form produced by [`Display`](std::fmt::Display),
    /// used to recognize a reply's JSON-RPC `id` as a correlation slot.
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix("corr-")?.parse().ok().map(Self)
    }
}

/// Registry of one-shot waiter slots for in-flight server→client requests.
#[derive(Default)]
pub struct CorrelationTable {
    next_id: AtomicU64,
    waiters: DashMap<CorrelationId, oneshot::Sender<Value>>,
}

/// A handle that resolves once the matching reply is delivered or the slot is cancelled.
pub struct Waiter {
    /// The id the caller should embed as the outgoing JSON-RPC request id.
    pub id: CorrelationId,
    receiver: oneshot::Receiver<Value>,
}

impl Waiter {
    /// Block until the reply arrives.
    ///
    /// Resolves to [`Error::UnknownCorrelation`] if the slot was cancelled
    /// (e.g. the owning session was torn down) before a reply landed.
    pub async fn recv(self) -> Result<Value> {
        self.receiver
            .await
            .map_err(|_| Error::UnknownCorrelation(self.id.to_string()))
    }
}

impl CorrelationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new waiter and return it alongside the id to send on the wire.
    pub fn begin(&self) -> Waiter {
        let id = CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, tx);
        Waiter { id, receiver: rx }
    }

    /// Deliver a reply to the waiter registered under `id`.
    ///
    /// The first delivery for a given id wins and consumes the slot; a
    /// second delivery (or one with no matching waiter at all) fails with
    /// [`Error::UnknownCorrelation`] rather than silently succeeding.
    pub fn deliver(&self, id: CorrelationId, payload: Value) -> Result<()> {
        match self.waiters.remove(&id) {
            Some((_, tx)) => {
                // Receiver may already be gone (cancelled); that's not an error here.
                let _ = tx.send(payload);
                Ok(())
            }
            None => Err(Error::UnknownCorrelation(id.to_string())),
        }
    }

    /// Cancel a pending waiter, e.g. because its session was torn down.
    ///
    /// Dropping the sender causes the waiter's [`Waiter::recv`] to resolve
    /// with [`Error::UnknownCorrelation`].
    pub fn cancel(&self, id: CorrelationId) {
        self.waiters.remove(&id);
    }

    /// Number of waiters currently pending a reply.
    pub fn pending_count(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_to_the_matching_waiter() {
        let table = CorrelationTable::new();
        let waiter = table.begin();
        let id = waiter.id;

        table.deliver(id, json!({"ok": true})).unwrap();
        let reply = waiter.recv().await.unwrap();
        assert_eq!(reply, json!({"ok": true}));
    }

    #[tokio::test]
    async fn second_delivery_is_rejected() {
        let table = CorrelationTable::new();
        let waiter = table.begin();
        let id = waiter.id;

        table.deliver(id, json!(1)).unwrap();
        let second = table.deliver(id, json!(2));
        assert!(matches!(second, Err(Error::UnknownCorrelation(_))));

        assert_eq!(waiter.recv().await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn cancel_resolves_waiter_with_error() {
        let table = CorrelationTable::new();
        let waiter = table.begin();
        table.cancel(waiter.id);

        let result = waiter.recv().await;
        assert!(matches!(result, Err(Error::UnknownCorrelation(_))));
    }

    #[test]
    fn deliver_with_no_waiter_is_an_error() {
        let table = CorrelationTable::new();
        let bogus = table.begin().id;
        table.cancel(bogus);
        assert!(matches!(
            table.deliver(bogus, json!(null)),
            Err(Error::UnknownCorrelation(_))
        ));
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let table = CorrelationTable::new();
        let a = table.begin().id;
        let b = table.begin().id;
        assert_ne!(a, b);
    }
}
