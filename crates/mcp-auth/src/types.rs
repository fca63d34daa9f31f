//! Core OAuth 2.1 data model: registered clients, authorization codes, issued
//! tokens, and the validated-token payload propagated to downstream handlers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a client authenticates itself at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// Public client: no secret, `client_id` alone identifies it.
    None,
    /// `Authorization: Basic base64(client_id:client_secret)`.
    ClientSecretBasic,
    /// `client_id`/`client_secret` as form fields.
    ClientSecretPost,
}

/// A registered OAuth client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Unique client identifier.
    pub client_id: String,
    /// Client secret. `None` for a public client.
    pub client_secret: Option<String>,
    /// Unix timestamp the secret expires at; `0` means never.
    pub secret_expires_at: u64,
    /// Registered redirect URIs, compared by exact string match.
    pub redirect_uris: Vec<String>,
    /// Grant types this client is allowed to use.
    pub grant_types: Vec<String>,
    /// Response types this client is allowed to request.
    pub response_types: Vec<String>,
    /// Token endpoint authentication method.
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
    /// Space-delimited scope string the client may request.
    pub scope: String,
}

impl OAuthClient {
    /// A public client has no secret and authenticates with `client_id` alone.
    pub fn is_public(&self) -> bool {
        self.token_endpoint_auth_method == TokenEndpointAuthMethod::None
    }

    /// Whether `secret` has expired (nonzero `secret_expires_at` in the past).
    pub fn secret_expired(&self, now: u64) -> bool {
        self.secret_expires_at != 0 && self.secret_expires_at < now
    }

    /// Exact-match redirect URI check, per the invariant in the data model.
    pub fn allows_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }
}

/// A single-use authorization code issued from `/authorize`.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeRecord {
    /// The code value itself.
    pub code: String,
    /// The client it was issued to.
    pub client_id: String,
    /// PKCE `S256` challenge presented at `/authorize`.
    pub pkce_challenge: String,
    /// The redirect URI it was issued against.
    pub redirect_uri: String,
    /// Scopes granted.
    pub scopes: Vec<String>,
    /// Resource indicator (RFC 8707), if supplied.
    pub resource: Option<String>,
    /// Unix timestamp this code expires at.
    pub expires_at: u64,
}

/// A bundle of tokens returned from `/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    /// The access token.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Lifetime in seconds from issuance.
    pub expires_in: u64,
    /// Refresh token, if issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Space-delimited granted scope, if narrower than requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// OIDC ID token, if the provider issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl TokenBundle {
    /// A bearer token bundle with no refresh token, scope, or id token.
    pub fn bearer(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: None,
            scope: None,
            id_token: None,
        }
    }
}

/// The validated result of checking a bearer token, propagated to downstream
/// handlers via the request context.
///
/// `token` is always cleared before this value leaves the verifier, per
/// §4.8 step 4 ("prevent accidental re-forwarding").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Client that the token was issued to, if present in the claims.
    pub client_id: Option<String>,
    /// Subject (`sub`) claim.
    pub subject: Option<String>,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Unix timestamp the token expires at.
    pub expires_at: Option<u64>,
    /// Resource (audience) the token is bound to, parsed and fragment-stripped.
    pub resource: Option<String>,
    /// All claims other than the standard registered set (see [`STANDARD_CLAIM_KEYS`]).
    pub extra: HashMap<String, serde_json::Value>,
}

impl AuthInfo {
    /// Whether every scope in `required` is present.
    pub fn has_scopes(&self, required: &[&str]) -> bool {
        required.iter().all(|s| self.scopes.iter().any(|g| g == s))
    }
}

/// Claims considered part of the standard registered set; everything else
/// ends up in [`AuthInfo::extra`] (§4.10 Token Verifier).
pub const STANDARD_CLAIM_KEYS: &[&str] = &[
    "iss",
    "sub",
    "aud",
    "exp",
    "iat",
    "jti",
    "kid",
    "scope",
    "scp",
    "client_id",
    "active",
    "username",
    "token_type",
    "token_type_hint",
];
