//! Crate-wide error type for the authorization server, resource server
//! middleware, and token verifier.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Result alias used throughout `mcp-auth`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised anywhere in `mcp-auth`.
///
/// These are deliberately coarse-grained: callers at the HTTP boundary map
/// them onto the OAuth error JSON (§OAuth Authorization-Server Endpoints) or
/// the `WWW-Authenticate` challenge (§OAuth Resource-Server Middleware), not
/// onto Rust-level error handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A request parameter was missing or malformed.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed or the client is unknown.
    #[error("invalid_client: {0}")]
    InvalidClient(String),

    /// An authorization code, refresh token, or PKCE verifier did not check out.
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// `grant_type` is not one this server supports.
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// The requested scope is malformed or exceeds what the client may request.
    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    /// The presented access token is missing, expired, or fails verification.
    #[error("invalid_token: {0}")]
    InvalidToken(String),

    /// The token is valid but lacks a required scope.
    #[error("insufficient_scope: {0}")]
    InsufficientScope(String),

    /// Dynamic client registration was attempted but the client metadata was invalid.
    #[error("invalid_client_metadata: {0}")]
    InvalidClientMetadata(String),

    /// Registration was attempted against a provider that does not support it.
    #[error("registration not supported")]
    RegistrationNotSupported,

    /// The caller exceeded a configured rate limit.
    #[error("rate limited")]
    RateLimited,

    /// A JWKS or introspection fetch failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// An unexpected internal failure (surfaced as `server_error`).
    #[error("server_error: {0}")]
    Internal(String),
}

impl Error {
    /// The OAuth `error` code for this failure (§6 External Interfaces, OAuth error JSON).
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::InvalidToken(_) => "invalid_token",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::InvalidClientMetadata(_) => "invalid_client_metadata",
            Self::RegistrationNotSupported => "unsupported_grant_type",
            Self::RateLimited => "server_error",
            Self::Fetch(_) | Self::Internal(_) => "server_error",
        }
    }

    /// The HTTP status this failure maps onto.
    pub fn status(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::UnsupportedGrantType(_)
            | Self::InvalidScope(_)
            | Self::InvalidClientMetadata(_) => StatusCode::BAD_REQUEST,
            Self::InvalidClient(_) | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientScope(_) => StatusCode::FORBIDDEN,
            Self::RegistrationNotSupported => StatusCode::NOT_IMPLEMENTED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Fetch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders as the OAuth error JSON body from §6 External Interfaces:
/// `{"error": "<code>", "error_description": "<text>"}`.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "error_description": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
