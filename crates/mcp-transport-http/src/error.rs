//! Error type for the streaming HTTP transport.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Result alias used throughout `mcp-transport-http`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while handling a streaming HTTP request, distinct from
/// errors the protocol core itself reports (those travel as JSON-RPC error
/// responses, not HTTP failures).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// The body parsed as JSON but not as a well-formed JSON-RPC message.
    #[error(transparent)]
    Message(#[from] mcp_core::Error),

    /// A non-`initialize` request arrived with no `Mcp-Session-Id` header
    /// while the transport is configured for stateful operation.
    #[error("Mcp-Session-Id header is required")]
    MissingSessionId,

    /// The supplied `Mcp-Session-Id` exceeded the maximum accepted length.
    #[error("Mcp-Session-Id header is malformed")]
    MalformedSessionId,

    /// The `Last-Event-ID` header was present but not a valid integer.
    #[error("Last-Event-ID header is malformed")]
    MalformedLastEventId,

    /// A GET request arrived without an `Accept: text/event-stream` header.
    #[error("GET requires Accept: text/event-stream")]
    SseNotAccepted,

    /// The protocol core rejected the request.
    #[error(transparent)]
    Protocol(#[from] mcp_protocol::Error),

    /// The session layer rejected the operation (e.g. stateless mode).
    #[error(transparent)]
    Session(#[from] mcp_session::Error),

    /// Binding the listener or serving connections failed.
    #[error("HTTP server failed: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidBody(_) | Self::Message(_) => StatusCode::BAD_REQUEST,
            Self::MissingSessionId | Self::MalformedSessionId | Self::MalformedLastEventId => {
                StatusCode::BAD_REQUEST
            }
            Self::SseNotAccepted => StatusCode::NOT_ACCEPTABLE,
            Self::Protocol(_) | Self::Session(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}
