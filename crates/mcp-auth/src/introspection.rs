//! RFC 7662 OAuth 2.0 Token Introspection, with positive/negative caching.
//!
//! Grounded on the teacher's `turbomcp-auth::introspection::IntrospectionClient`
//! request/response shape, with caching added per this spec's §4.10
//! ("Cache: positive TTL = min(configured, remaining exp); negative TTL for
//! inactive/4xx responses").

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// RFC 7662 §2.2 introspection response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active.
    pub active: bool,
    /// Scope(s) associated with the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Client identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Expiration (Unix seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Additional fields not modeled above.
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

#[derive(Clone)]
enum CacheEntry {
    Positive(IntrospectionResponse),
    Negative,
}

struct Cached {
    entry: CacheEntry,
    expires_at: SystemTime,
}

/// Introspects opaque or JWT tokens against an authorization server's
/// `/introspect` endpoint, caching both active and inactive results.
pub struct IntrospectionClient {
    endpoint: String,
    client_id: String,
    client_secret: Option<String>,
    http_client: reqwest::Client,
    positive_ttl: Duration,
    negative_ttl: Duration,
    cache: DashMap<String, Cached>,
}

impl std::fmt::Debug for IntrospectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntrospectionClient")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl IntrospectionClient {
    /// Build a client against `endpoint`, authenticating with `client_id`/`client_secret`.
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client builds with a fixed timeout"),
            positive_ttl: Duration::from_secs(60),
            negative_ttl: Duration::from_secs(30),
            cache: DashMap::new(),
        }
    }

    /// Override the ceiling on the positive-cache TTL (actual TTL is
    /// `min(configured, remaining exp)`).
    pub fn with_positive_ttl(mut self, ttl: Duration) -> Self {
        self.positive_ttl = ttl;
        self
    }

    /// Override the negative-cache TTL for inactive/4xx responses.
    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    /// Introspect `token`, consulting the cache first.
    pub async fn introspect(&self, token: &str) -> Result<IntrospectionResponse> {
        if let Some(cached) = self.cache.get(token) {
            if cached.expires_at > SystemTime::now() {
                return match &cached.entry {
                    CacheEntry::Positive(response) => Ok(response.clone()),
                    CacheEntry::Negative => Ok(IntrospectionResponse {
                        active: false,
                        scope: None,
                        client_id: None,
                        exp: None,
                        sub: None,
                        aud: None,
                        iss: None,
                        additional: HashMap::new(),
                    }),
                };
            }
        }

        let form = [("token", token), ("token_type_hint", "access_token")];
        let mut request = self.http_client.post(&self.endpoint).form(&form);
        if let Some(secret) = &self.client_secret {
            request = request.basic_auth(&self.client_id, Some(secret));
        } else {
            request = request.basic_auth(&self.client_id, None::<&str>);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            self.cache_negative(token);
            return Ok(IntrospectionResponse {
                active: false,
                scope: None,
                client_id: None,
                exp: None,
                sub: None,
                aud: None,
                iss: None,
                additional: HashMap::new(),
            });
        }

        let parsed: IntrospectionResponse = response.json().await?;
        if parsed.active {
            self.cache_positive(token, parsed.clone());
        } else {
            self.cache_negative(token);
        }
        Ok(parsed)
    }

    fn cache_positive(&self, token: &str, response: IntrospectionResponse) {
        let remaining = response
            .exp
            .and_then(|exp| {
                let now = SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .ok()?
                    .as_secs();
                exp.checked_sub(now).map(Duration::from_secs)
            })
            .unwrap_or(self.positive_ttl);
        let ttl = remaining.min(self.positive_ttl);
        self.cache.insert(
            token.to_string(),
            Cached {
                entry: CacheEntry::Positive(response),
                expires_at: SystemTime::now() + ttl,
            },
        );
    }

    fn cache_negative(&self, token: &str) {
        self.cache.insert(
            token.to_string(),
            Cached {
                entry: CacheEntry::Negative,
                expires_at: SystemTime::now() + self.negative_ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttls_match_spec_defaults() {
        let client = IntrospectionClient::new("https://as/introspect", "client", None);
        assert_eq!(client.positive_ttl, Duration::from_secs(60));
        assert_eq!(client.negative_ttl, Duration::from_secs(30));
    }

    #[test]
    fn ttls_are_overridable() {
        let client = IntrospectionClient::new("https://as/introspect", "client", None)
            .with_positive_ttl(Duration::from_secs(120))
            .with_negative_ttl(Duration::from_secs(5));
        assert_eq!(client.positive_ttl, Duration::from_secs(120));
        assert_eq!(client.negative_ttl, Duration::from_secs(5));
    }
}
