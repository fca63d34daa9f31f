//! Per-session outbound queue feeding the SSE stream (or stdio writer) for a session.
//!
//! Two kinds of traffic share one FIFO queue per session:
//!
//! - **Notifications** (server-initiated, no reply expected): under
//!   backpressure the *oldest* queued notification is dropped to make room.
//!   Losing a stale progress update is preferable to blocking the caller.
//! - **Correlated responses** (the reply to a request the client is actively
//!   waiting on): these must not be dropped, so enqueuing blocks up to a
//!   deadline and fails loudly if the queue never drains in time.
//!
//! Ordering is FIFO *within* a session only; there is no cross-session
//! ordering guarantee, matching the teacher's per-connection broadcast model.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::session::SessionId;

/// One item sitting in a session's outbound queue.
#[derive(Debug, Clone)]
pub enum BusMessage {
    /// A one-way notification; may be silently dropped under backpressure.
    Notification(Value),
    /// A reply correlated to a specific request; must be delivered.
    Response(Value),
}

struct Queue {
    items: Mutex<VecDeque<BusMessage>>,
    capacity: usize,
    not_empty: Notify,
    not_full: Notify,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }
}

/// A bounded, per-session multi-producer single-consumer notification queue.
pub struct NotificationBus {
    queues: DashMap<SessionId, Arc<Queue>>,
    capacity: usize,
}

impl NotificationBus {
    /// Create a bus whose per-session queues hold at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity,
        }
    }

    fn queue_for(&self, session: &SessionId) -> Arc<Queue> {
        self.queues
            .entry(session.clone())
            .or_insert_with(|| Arc::new(Queue::new(self.capacity)))
            .clone()
    }

    /// Drop a session's queue, e.g. on session termination.
    pub fn remove_session(&self, session: &SessionId) {
        self.queues.remove(session);
    }

    /// Enqueue a notification, dropping the oldest queued item if full.
    pub async fn push_notification(&self, session: &SessionId, payload: Value) {
        let queue = self.queue_for(session);
        let mut items = queue.items.lock().await;
        if items.len() >= queue.capacity {
            let dropped = items.pop_front();
            warn!(
                target: "mcp_session::notification_bus",
                session = %session,
                dropped = dropped.is_some(),
                "notification queue full, dropping oldest entry"
            );
        }
        items.push_back(BusMessage::Notification(payload));
        drop(items);
        queue.not_empty.notify_one();
    }

    /// Enqueue a correlated response, blocking until room is available or
    /// `deadline` elapses.
    pub async fn push_response(
        &self,
        session: &SessionId,
        payload: Value,
        deadline: Duration,
    ) -> Result<()> {
        let queue = self.queue_for(session);
        let wait_result = tokio::time::timeout(deadline, async {
            loop {
                {
                    let mut items = queue.items.lock().await;
                    if items.len() < queue.capacity {
                        items.push_back(BusMessage::Response(payload.clone()));
                        return;
                    }
                }
                queue.not_full.notified().await;
            }
        })
        .await;

        match wait_result {
            Ok(()) => {
                queue.not_empty.notify_one();
                Ok(())
            }
            Err(_) => Err(Error::DeliveryTimeout(deadline)),
        }
    }

    /// Pop the next queued item for a session, if any (non-blocking).
    pub async fn try_pop(&self, session: &SessionId) -> Option<BusMessage> {
        let queue = self.queues.get(session)?.clone();
        let mut items = queue.items.lock().await;
        let popped = items.pop_front();
        if popped.is_some() {
            drop(items);
            queue.not_full.notify_one();
        }
        popped
    }

    /// Pop the next queued item for a session, waiting if the queue is empty.
    pub async fn pop(&self, session: &SessionId) -> BusMessage {
        let queue = self.queue_for(session);
        loop {
            {
                let mut items = queue.items.lock().await;
                if let Some(item) = items.pop_front() {
                    drop(items);
                    queue.not_full.notify_one();
                    return item;
                }
            }
            queue.not_empty.notified().await;
        }
    }

    /// Broadcast a notification to every session whose id matches `filter`.
    ///
    /// Returns `(success_count, failure_count, last_error)`. A session's push
    /// only "fails" in the sense tracked here if its id isn't found, which in
    /// practice means the predicate raced a termination; the count exists so
    /// callers can log the discrepancy without aborting the whole broadcast.
    pub async fn broadcast<F>(
        &self,
        payload: Value,
        filter: F,
    ) -> (usize, usize, Option<String>)
    where
        F: Fn(&SessionId) -> bool,
    {
        let matching: Vec<SessionId> = self
            .queues
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|id| filter(id))
            .collect();

        let mut success = 0;
        let mut failure = 0;
        let mut last_error = None;

        for session in matching {
            if self.queues.contains_key(&session) {
                self.push_notification(&session, payload.clone()).await;
                success += 1;
            } else {
                failure += 1;
                last_error = Some(format!("session {session} vanished mid-broadcast"));
            }
        }

        debug!(
            target: "mcp_session::notification_bus",
            success, failure, "broadcast complete"
        );
        (success, failure, last_error)
    }
}
