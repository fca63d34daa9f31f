//! Builder-pattern configuration for the authorization server and the
//! resource-server bearer middleware, in the style of
//! `HttpTransportConfigBuilder`/`JwtValidator`'s `with_*` methods rather
//! than a config-file crate.

use std::time::Duration;

/// Configuration for the OAuth 2.1 authorization-server endpoints (§4.9).
#[derive(Clone, Debug)]
pub struct AuthServerConfig {
    /// Issuer URL embedded in discovery documents and minted tokens.
    /// Must be HTTPS unless it is localhost/127.0.0.1 (development exemption).
    pub issuer: String,
    /// Path the `/authorize` endpoint is served on.
    pub authorize_path: String,
    /// Path the `/token` endpoint is served on.
    pub token_path: String,
    /// Path the `/register` endpoint is served on.
    pub register_path: String,
    /// Path the `/revoke` endpoint is served on.
    pub revoke_path: String,
    /// Whether dynamic client registration (`/register`) is enabled.
    pub registration_enabled: bool,
    /// Scopes advertised in `scopes_supported` on both discovery documents.
    pub scopes_supported: Vec<String>,
    /// Authorization code lifetime.
    pub code_ttl: Duration,
    /// Access token lifetime.
    pub access_token_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_token_ttl: Duration,
    /// Default confidential-client secret lifetime (0 = never expires).
    pub default_secret_ttl: Duration,
    /// `/register` rate limit, requests per hour (spec default: 20).
    pub registration_rate_limit_per_hour: u32,
}

impl Default for AuthServerConfig {
    fn default() -> Self {
        AuthServerConfigBuilder::new("http://127.0.0.1:8081")
            .build()
            .expect("default issuer http://127.0.0.1:8081 satisfies the localhost exemption")
    }
}

/// Builder for [`AuthServerConfig`].
#[derive(Debug, Clone)]
pub struct AuthServerConfigBuilder {
    issuer: String,
    authorize_path: String,
    token_path: String,
    register_path: String,
    revoke_path: String,
    registration_enabled: bool,
    scopes_supported: Vec<String>,
    code_ttl: Duration,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    default_secret_ttl: Duration,
    registration_rate_limit_per_hour: u32,
}

impl AuthServerConfigBuilder {
    /// A builder with sensible defaults: 10 minute code TTL, 1 hour access
    /// tokens, 30 day refresh tokens, 30 day client secrets, registration
    /// disabled, no scopes advertised, 20 registrations/hour.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            authorize_path: "/authorize".to_string(),
            token_path: "/token".to_string(),
            register_path: "/register".to_string(),
            revoke_path: "/revoke".to_string(),
            registration_enabled: false,
            scopes_supported: Vec::new(),
            code_ttl: Duration::from_secs(600),
            access_token_ttl: Duration::from_secs(3600),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            default_secret_ttl: Duration::from_secs(30 * 24 * 3600),
            registration_rate_limit_per_hour: 20,
        }
    }

    /// Override the `/authorize` path (default `/authorize`).
    pub fn with_authorize_path(mut self, path: impl Into<String>) -> Self {
        self.authorize_path = path.into();
        self
    }

    /// Override the `/token` path (default `/token`).
    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Override the `/register` path (default `/register`).
    pub fn with_register_path(mut self, path: impl Into<String>) -> Self {
        self.register_path = path.into();
        self
    }

    /// Override the `/revoke` path (default `/revoke`).
    pub fn with_revoke_path(mut self, path: impl Into<String>) -> Self {
        self.revoke_path = path.into();
        self
    }

    /// Enable the `/register` endpoint (disabled by default, per spec's
    /// "if the provider does not support registration, return 501").
    pub fn with_registration_enabled(mut self, enabled: bool) -> Self {
        self.registration_enabled = enabled;
        self
    }

    /// Scopes advertised in `scopes_supported`.
    pub fn with_scopes_supported(mut self, scopes: Vec<String>) -> Self {
        self.scopes_supported = scopes;
        self
    }

    /// Override the authorization code lifetime (default 10 minutes).
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    /// Override the access token lifetime (default 1 hour).
    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Override the refresh token lifetime (default 30 days).
    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Override the default confidential-client secret lifetime (default 30
    /// days; 0 means never expires).
    pub fn with_default_secret_ttl(mut self, ttl: Duration) -> Self {
        self.default_secret_ttl = ttl;
        self
    }

    /// Override the `/register` rate limit (default 20/hour).
    pub fn with_registration_rate_limit_per_hour(mut self, limit: u32) -> Self {
        self.registration_rate_limit_per_hour = limit;
        self
    }

    /// Build the configuration, rejecting an `issuer` that fails §4.9's
    /// "must be HTTPS, localhost/127.0.0.1 exempted, no fragment, no query"
    /// invariant — an invalid issuer would otherwise be advertised verbatim
    /// in both discovery documents and minted tokens.
    pub fn build(self) -> crate::error::Result<AuthServerConfig> {
        let config = AuthServerConfig {
            issuer: self.issuer,
            authorize_path: self.authorize_path,
            token_path: self.token_path,
            register_path: self.register_path,
            revoke_path: self.revoke_path,
            registration_enabled: self.registration_enabled,
            scopes_supported: self.scopes_supported,
            code_ttl: self.code_ttl,
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
            default_secret_ttl: self.default_secret_ttl,
            registration_rate_limit_per_hour: self.registration_rate_limit_per_hour,
        };
        if !config.issuer_is_valid() {
            return Err(crate::error::Error::InvalidRequest(format!(
                "issuer {:?} must be HTTPS (localhost/127.0.0.1 exempted) with no fragment or query",
                config.issuer
            )));
        }
        Ok(config)
    }
}

impl AuthServerConfig {
    /// Whether `issuer` satisfies the discovery document's "must be HTTPS,
    /// localhost/127.0.0.1 exempted" rule.
    pub fn issuer_is_valid(&self) -> bool {
        let Ok(url) = url::Url::parse(&self.issuer) else {
            return false;
        };
        if url.fragment().is_some() || url.query().is_some() {
            return false;
        }
        if url.scheme() == "https" {
            return true;
        }
        matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"))
    }
}

/// Configuration for the resource-server bearer middleware (§4.8).
#[derive(Clone, Debug, Default)]
pub struct ResourceServerConfig {
    /// Scopes every protected request must carry.
    pub required_scopes: Vec<String>,
    /// If set, the token's `iss` must equal this value.
    pub expected_issuer: Option<String>,
    /// If non-empty, the token's resource must match one of these
    /// (trailing `#` stripped on both sides, per §4.8 step 3b).
    pub expected_audience: Vec<String>,
    /// URL advertised in `WWW-Authenticate: ... resource_metadata="<url>"`.
    pub resource_metadata_url: Option<String>,
}

impl ResourceServerConfig {
    /// An unconfigured resource-server config: no scopes required, no
    /// issuer/audience enforcement, no metadata URL advertised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `scopes` on every protected request.
    pub fn with_required_scopes(mut self, scopes: Vec<String>) -> Self {
        self.required_scopes = scopes;
        self
    }

    /// Enforce the token's `iss` claim equals `issuer`.
    pub fn with_expected_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    /// Enforce the token's resource is one of `audience`.
    pub fn with_expected_audience(mut self, audience: Vec<String>) -> Self {
        self.expected_audience = audience;
        self
    }

    /// Advertise `url` as `resource_metadata` in 401 `WWW-Authenticate` headers.
    pub fn with_resource_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.resource_metadata_url = Some(url.into());
        self
    }
}
