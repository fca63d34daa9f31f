//! Session identity, state, and the pluggable [`SessionStore`] backend trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum accepted length of a client-supplied session id.
pub const MAX_SESSION_ID_LEN: usize = 256;

/// Opaque, unguessable session identifier bound to the `Mcp-Session-Id` header.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session id, formatted `mcp-{uuid}`.
    pub fn new() -> Self {
        Self(format!("mcp-{}", uuid::Uuid::new_v4()))
    }

    /// Wrap a client- or test-supplied string as a session id.
    ///
    /// Returns `None` if it exceeds [`MAX_SESSION_ID_LEN`].
    pub fn try_from_string(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        (s.len() <= MAX_SESSION_ID_LEN).then_some(Self(s))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an MCP session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for the client's `notifications/initialized` acknowledgment.
    #[default]
    Pending,
    /// Fully initialized and accepting requests.
    Active,
    /// Terminated via DELETE or server-side cleanup; the id must not be reused.
    Terminated,
}

/// A live MCP session and its negotiated metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// The session's identifier.
    pub id: SessionId,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Unix milliseconds at creation.
    pub created_at: u64,
    /// Unix milliseconds of the last request or event on this session.
    pub last_activity: u64,
    /// `clientInfo` reported in `initialize`, if any.
    pub client_info: Option<serde_json::Value>,
    /// Protocol version negotiated during the handshake.
    pub protocol_version: Option<String>,
}

impl Session {
    /// Create a freshly [`SessionState::Pending`] session.
    pub fn new(id: SessionId) -> Self {
        let now = now_ms();
        Self {
            id,
            state: SessionState::Pending,
            created_at: now,
            last_activity: now,
            client_info: None,
            protocol_version: None,
        }
    }

    /// Whether the session can still accept incoming requests.
    pub fn can_accept_requests(&self) -> bool {
        matches!(self.state, SessionState::Pending | SessionState::Active)
    }

    /// Move to [`SessionState::Active`] after the initialized notification.
    pub fn activate(&mut self) {
        self.state = SessionState::Active;
    }

    /// Move to [`SessionState::Terminated`].
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }

    /// Refresh the activity timestamp to now.
    pub fn touch(&mut self) {
        self.last_activity = now_ms();
    }

    /// Whether more than `timeout_ms` have elapsed since the last activity.
    pub fn is_expired(&self, now_ms: u64, timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity) > timeout_ms
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Pluggable session storage backend.
///
/// The default in-process implementation is [`InMemorySessionStore`]; a
/// server configured for stateless operation installs [`NullSessionStore`]
/// instead, which rejects every operation with [`Error::StatelessMode`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create and persist a new [`SessionState::Pending`] session, returning its id.
    async fn create(&self) -> Result<SessionId>;

    /// Fetch a session snapshot by id.
    async fn get(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Overwrite a session's stored state.
    async fn update(&self, session: Session) -> Result<()>;

    /// Remove a session permanently.
    async fn delete(&self, id: &SessionId) -> Result<()>;

    /// List every currently stored session id.
    async fn list(&self) -> Result<Vec<SessionId>>;

    /// Remove sessions whose last activity predates `now_ms - timeout_ms`.
    ///
    /// Returns the number of sessions removed. Default: no-op.
    async fn cleanup_expired(&self, _now_ms: u64, _timeout_ms: u64) -> Result<u64> {
        Ok(0)
    }
}

/// Concurrent, in-process [`SessionStore`] backed by a [`DashMap`].
///
/// Grounded in the teacher's sharded-map session registries: reads and
/// writes to distinct sessions never block one another.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Session>,
}

impl InMemorySessionStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> Result<SessionId> {
        let id = SessionId::new();
        self.sessions.insert(id.clone(), Session::new(id.clone()));
        Ok(id)
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn update(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        Ok(self.sessions.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn cleanup_expired(&self, now_ms: u64, timeout_ms: u64) -> Result<u64> {
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now_ms, timeout_ms))
            .map(|entry| entry.key().clone())
            .collect();
        let count = expired.len() as u64;
        for id in expired {
            self.sessions.remove(&id);
        }
        Ok(count)
    }
}

/// No-op [`SessionStore`] for servers running in stateless mode.
///
/// Every method fails with [`Error::StatelessMode`] so callers (the protocol
/// core's session-dependent handlers, e.g. `roots/list`) get a uniform error
/// rather than silently succeeding against a phantom session.
#[derive(Default)]
pub struct NullSessionStore;

#[async_trait]
impl SessionStore for NullSessionStore {
    async fn create(&self) -> Result<SessionId> {
        Err(Error::StatelessMode)
    }

    async fn get(&self, _id: &SessionId) -> Result<Option<Session>> {
        Err(Error::StatelessMode)
    }

    async fn update(&self, _session: Session) -> Result<()> {
        Err(Error::StatelessMode)
    }

    async fn delete(&self, _id: &SessionId) -> Result<()> {
        Err(Error::StatelessMode)
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        Err(Error::StatelessMode)
    }
}

/// Allocates sequential numeric suffixes, used by tests that need deterministic ids.
#[derive(Default)]
pub struct SequentialIdAllocator(AtomicU64);

impl SequentialIdAllocator {
    /// Next monotonically increasing value, starting at 0.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Convenience alias for handlers that key auxiliary state by session.
pub type SessionMap<V> = HashMap<SessionId, V>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemorySessionStore::new();
        let id = store.create().await.unwrap();

        let session = store.get(&id).await.unwrap().unwrap();
        assert_eq!(session.state, SessionState::Pending);

        let mut updated = session;
        updated.activate();
        store.update(updated).await.unwrap();

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.state, SessionState::Active);

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_reflects_live_sessions() {
        let store = InMemorySessionStore::new();
        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();
        let mut ids = store.list().await.unwrap();
        ids.sort_by_key(|id| id.as_str().to_string());
        let mut expected = vec![a, b];
        expected.sort_by_key(|id| id.as_str().to_string());
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn cleanup_expired_removes_stale_sessions() {
        let store = InMemorySessionStore::new();
        let id = store.create().await.unwrap();
        let mut session = store.get(&id).await.unwrap().unwrap();
        session.last_activity = 0;
        store.update(session).await.unwrap();

        let removed = store.cleanup_expired(100_000, 1_000).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_store_always_reports_stateless_mode() {
        let store = NullSessionStore;
        assert!(matches!(store.create().await, Err(Error::StatelessMode)));
    }

    #[test]
    fn session_id_rejects_oversized_strings() {
        assert!(SessionId::try_from_string("a".repeat(MAX_SESSION_ID_LEN)).is_some());
        assert!(SessionId::try_from_string("a".repeat(MAX_SESSION_ID_LEN + 1)).is_none());
    }
}
