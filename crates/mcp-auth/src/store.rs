//! Pluggable storage for registered clients, authorization codes, and
//! refresh tokens, with in-memory implementations suitable for a single
//! process (no cross-restart persistence, per this spec's Non-goals).

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::types::{AuthorizationCodeRecord, OAuthClient};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the epoch")
        .as_secs()
}

/// Lookup of registered OAuth clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Fetch a client by id, or `None` if unregistered.
    async fn get(&self, client_id: &str) -> Result<Option<OAuthClient>>;

    /// Register a new client. Implementations of dynamic registration call this.
    async fn insert(&self, client: OAuthClient) -> Result<()>;
}

/// In-memory client store.
#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    clients: DashMap<String, OAuthClient>,
}

impl InMemoryClientStore {
    /// An empty client store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn get(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        Ok(self.clients.get(client_id).map(|c| c.clone()))
    }

    async fn insert(&self, client: OAuthClient) -> Result<()> {
        self.clients.insert(client.client_id.clone(), client);
        Ok(())
    }
}

/// Single-use authorization code storage.
///
/// `consume` is the one operation that must be exactly-once: a reused code
/// is an `invalid_grant`, per §3 Data Model's "single-use" invariant.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Store a freshly issued code.
    async fn insert(&self, record: AuthorizationCodeRecord) -> Result<()>;

    /// Atomically remove and return the code record, if it exists and has not expired.
    async fn consume(&self, code: &str) -> Result<Option<AuthorizationCodeRecord>>;
}

/// In-memory code store. Expired entries are pruned lazily on `consume`.
#[derive(Debug, Default)]
pub struct InMemoryCodeStore {
    codes: DashMap<String, AuthorizationCodeRecord>,
}

impl InMemoryCodeStore {
    /// An empty code store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn insert(&self, record: AuthorizationCodeRecord) -> Result<()> {
        self.codes.insert(record.code.clone(), record);
        Ok(())
    }

    async fn consume(&self, code: &str) -> Result<Option<AuthorizationCodeRecord>> {
        let Some((_, record)) = self.codes.remove(code) else {
            return Ok(None);
        };
        if record.expires_at < now_unix() {
            return Ok(None);
        }
        Ok(Some(record))
    }
}

/// A stored refresh token and the subject/client/scope it was issued for.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    /// Client the token belongs to.
    pub client_id: String,
    /// Subject the original access token was issued for.
    pub subject: Option<String>,
    /// Scopes the original grant covered.
    pub scopes: Vec<String>,
    /// Resource indicator, if the original grant was resource-bound.
    pub resource: Option<String>,
}

/// Refresh token storage, keyed by the opaque token string.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store a newly issued refresh token.
    async fn insert(&self, token: String, record: RefreshTokenRecord) -> Result<()>;

    /// Look up a refresh token's record without consuming it.
    async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Remove a refresh token (rotation, revocation).
    async fn remove(&self, token: &str) -> Result<()>;
}

/// In-memory refresh token store.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: DashMap<String, RefreshTokenRecord>,
}

impl InMemoryRefreshTokenStore {
    /// An empty refresh token store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, token: String, record: RefreshTokenRecord) -> Result<()> {
        self.tokens.insert(token, record);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.tokens.get(token).map(|r| r.clone()))
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.tokens.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenEndpointAuthMethod;

    fn sample_client(id: &str) -> OAuthClient {
        OAuthClient {
            client_id: id.to_string(),
            client_secret: Some("secret".to_string()),
            secret_expires_at: 0,
            redirect_uris: vec!["https://r/cb".to_string()],
            grant_types: vec!["authorization_code".to_string()],
            response_types: vec!["code".to_string()],
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretBasic,
            scope: "mcp.read mcp.write".to_string(),
        }
    }

    #[tokio::test]
    async fn client_store_round_trips() {
        let store = InMemoryClientStore::new();
        store.insert(sample_client("C")).await.unwrap();
        let fetched = store.get("C").await.unwrap().unwrap();
        assert_eq!(fetched.client_id, "C");
        assert!(store.get("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn code_store_is_single_use() {
        let store = InMemoryCodeStore::new();
        store
            .insert(AuthorizationCodeRecord {
                code: "abc".to_string(),
                client_id: "C".to_string(),
                pkce_challenge: "challenge".to_string(),
                redirect_uri: "https://r/cb".to_string(),
                scopes: vec!["mcp.read".to_string()],
                resource: None,
                expires_at: now_unix() + 60,
            })
            .await
            .unwrap();

        assert!(store.consume("abc").await.unwrap().is_some());
        assert!(store.consume("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_code_is_not_returned() {
        let store = InMemoryCodeStore::new();
        store
            .insert(AuthorizationCodeRecord {
                code: "abc".to_string(),
                client_id: "C".to_string(),
                pkce_challenge: "challenge".to_string(),
                redirect_uri: "https://r/cb".to_string(),
                scopes: vec![],
                resource: None,
                expires_at: now_unix().saturating_sub(1),
            })
            .await
            .unwrap();

        assert!(store.consume("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_token_store_carries_metadata() {
        let store = InMemoryRefreshTokenStore::new();
        store
            .insert(
                "rt-1".to_string(),
                RefreshTokenRecord {
                    client_id: "C".to_string(),
                    subject: Some("user-1".to_string()),
                    scopes: vec!["mcp.read".to_string()],
                    resource: None,
                },
            )
            .await
            .unwrap();

        let record = store.get("rt-1").await.unwrap().unwrap();
        assert_eq!(record.client_id, "C");

        store.remove("rt-1").await.unwrap();
        assert!(store.get("rt-1").await.unwrap().is_none());
    }
}
