//! Shared state threaded into every authorization-server axum handler,
//! mirroring `mcp-transport-http::state::AppState`'s shape (config plus the
//! wired-together collaborators a handler needs).

use std::sync::Arc;

use crate::config::AuthServerConfig;
use crate::rate_limit::RateLimiter;
use crate::signing::TokenSigner;
use crate::store::{ClientStore, CodeStore, RefreshTokenStore};

/// State for the `/authorize`, `/token`, `/register`, `/revoke`, and
/// `.well-known` handlers.
#[derive(Clone)]
pub struct AuthServerState {
    /// Endpoint paths, TTLs, and feature flags.
    pub config: AuthServerConfig,
    /// Registered OAuth clients.
    pub clients: Arc<dyn ClientStore>,
    /// Outstanding authorization codes.
    pub codes: Arc<dyn CodeStore>,
    /// Outstanding refresh tokens.
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    /// Mints this server's access/id tokens.
    pub signer: Arc<TokenSigner>,
    /// Shared rate limiter for `/register` (and, if desired, other endpoints).
    pub rate_limiter: Arc<RateLimiter>,
}

impl AuthServerState {
    /// Build state around fresh in-memory stores and the embedded demo
    /// signing key. Suitable for development and the integration tests;
    /// a production deployment swaps in its own stores and
    /// [`TokenSigner::from_rsa_pem`].
    pub fn in_memory(config: AuthServerConfig) -> Self {
        let signer = Arc::new(TokenSigner::demo(config.issuer.clone()));
        Self {
            config,
            clients: Arc::new(crate::store::InMemoryClientStore::new()),
            codes: Arc::new(crate::store::InMemoryCodeStore::new()),
            refresh_tokens: Arc::new(crate::store::InMemoryRefreshTokenStore::new()),
            signer,
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }
}
