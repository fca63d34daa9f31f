//! Per-session bounded event log backing SSE resumption via `Last-Event-ID`.
//!
//! Each session keeps a ring of its most recent events, tagged with a
//! strictly monotonic id. A reconnecting GET carries `Last-Event-ID`, and
//! [`EventLog::replay_from`] returns the strict suffix of events after it —
//! never a prefix, never the event itself again.

use std::collections::VecDeque;

use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::session::SessionId;

/// One durable (for the lifetime of the process) event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Monotonic id, unique within a session, rendered as the SSE `id:` field.
    pub id: u64,
    /// The JSON-RPC message text carried as the SSE `data:` field.
    pub data: String,
}

struct SessionLog {
    capacity: usize,
    next_id: u64,
    events: VecDeque<StoredEvent>,
}

impl SessionLog {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: 0,
            events: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    fn append(&mut self, data: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(StoredEvent { id, data });
        id
    }

    fn replay_from(&self, last_event_id: u64) -> Result<Vec<StoredEvent>> {
        let oldest = self.events.front().map(|e| e.id);
        match oldest {
            // Log is empty: anything the client already saw is gone, but
            // there's also nothing to replay, so an empty suffix is correct
            // only if the requested id is not newer than what we'd have emitted.
            None => Ok(Vec::new()),
            Some(oldest_id) if last_event_id + 1 < oldest_id => {
                Err(Error::EventNotFound(last_event_id.to_string()))
            }
            _ => Ok(self
                .events
                .iter()
                .filter(|e| e.id > last_event_id)
                .cloned()
                .collect()),
        }
    }
}

/// Registry of per-session [`SessionLog`]s.
pub struct EventLog {
    capacity: usize,
    logs: DashMap<SessionId, SessionLog>,
}

impl EventLog {
    /// Create a log keeping at most `capacity` events per session.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            logs: DashMap::new(),
        }
    }

    /// Append an event for a session and return its newly assigned id.
    pub fn append(&self, session: &SessionId, data: String) -> u64 {
        let mut log = self
            .logs
            .entry(session.clone())
            .or_insert_with(|| SessionLog::new(self.capacity));
        log.append(data)
    }

    /// Replay the strict suffix of events after `last_event_id`.
    ///
    /// Errors with [`Error::EventNotFound`] if `last_event_id` has already
    /// rotated out of the retained window, since the client may have missed
    /// events that can no longer be reconstructed.
    pub fn replay_from(&self, session: &SessionId, last_event_id: u64) -> Result<Vec<StoredEvent>> {
        match self.logs.get(session) {
            Some(log) => log.replay_from(last_event_id),
            None => Ok(Vec::new()),
        }
    }

    /// The most recently assigned event id for a session, if any have been appended.
    pub fn latest_id(&self, session: &SessionId) -> Option<u64> {
        self.logs.get(session).and_then(|log| log.events.back().map(|e| e.id))
    }

    /// Events after `cursor`, or every retained event if `cursor` is `None`.
    ///
    /// Used by a fresh SSE connection that wants only events appended after
    /// it attaches (`cursor` seeded from [`EventLog::latest_id`]) as well as
    /// a reconnecting one resuming from a specific `Last-Event-ID`.
    pub fn since(&self, session: &SessionId, cursor: Option<u64>) -> Result<Vec<StoredEvent>> {
        match cursor {
            Some(last_event_id) => self.replay_from(session, last_event_id),
            None => Ok(self
                .logs
                .get(session)
                .map(|log| log.events.iter().cloned().collect())
                .unwrap_or_default()),
        }
    }

    /// Drop a session's retained events, e.g. on termination.
    pub fn remove_session(&self, session: &SessionId) {
        self.logs.remove(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_returns_strict_suffix() {
        let log = EventLog::new(10);
        let session = SessionId::new();
        log.append(&session, "a".into());
        log.append(&session, "b".into());
        log.append(&session, "c".into());

        let replayed = log.replay_from(&session, 0).unwrap();
        assert_eq!(
            replayed.iter().map(|e| e.data.as_str()).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
    }

    #[test]
    fn replay_from_latest_is_empty() {
        let log = EventLog::new(10);
        let session = SessionId::new();
        let last = log.append(&session, "a".into());
        assert!(log.replay_from(&session, last).unwrap().is_empty());
    }

    #[test]
    fn rotated_out_events_are_reported_as_not_found() {
        let log = EventLog::new(2);
        let session = SessionId::new();
        log.append(&session, "a".into());
        log.append(&session, "b".into());
        log.append(&session, "c".into());

        let result = log.replay_from(&session, 0);
        assert!(matches!(result, Err(Error::EventNotFound(_))));
    }

    #[test]
    fn unknown_session_replays_empty() {
        let log = EventLog::new(10);
        let session = SessionId::new();
        assert!(log.replay_from(&session, 0).unwrap().is_empty());
    }

    #[test]
    fn since_with_no_cursor_returns_everything_retained() {
        let log = EventLog::new(10);
        let session = SessionId::new();
        log.append(&session, "a".into());
        log.append(&session, "b".into());

        let all = log.since(&session, None).unwrap();
        assert_eq!(all.iter().map(|e| e.data.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn latest_id_tracks_most_recent_append() {
        let log = EventLog::new(10);
        let session = SessionId::new();
        assert_eq!(log.latest_id(&session), None);
        log.append(&session, "a".into());
        let last = log.append(&session, "b".into());
        assert_eq!(log.latest_id(&session), Some(last));
    }

    #[test]
    fn ids_are_monotonic_even_after_rotation() {
        let log = EventLog::new(2);
        let session = SessionId::new();
        let a = log.append(&session, "a".into());
        let b = log.append(&session, "b".into());
        let c = log.append(&session, "c".into());
        assert!(a < b);
        assert!(b < c);
    }
}
