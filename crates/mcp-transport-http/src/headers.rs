//! Header name constants and small parsing helpers shared by the handlers.

use axum::http::HeaderMap;
use mcp_session::SessionId;

use crate::error::{Error, Result};

/// Header carrying the opaque session id, set by the server and echoed by the client.
pub const MCP_SESSION_ID: &str = "Mcp-Session-Id";

/// Header a reconnecting GET carries to resume SSE from a prior event id.
pub const LAST_EVENT_ID: &str = "Last-Event-ID";

/// Header negotiating which MCP protocol revision the client expects.
pub const MCP_PROTOCOL_VERSION: &str = "MCP-Protocol-Version";

/// Read the `Mcp-Session-Id` header, if present and well-formed.
pub fn session_id_header(headers: &HeaderMap) -> Result<Option<SessionId>> {
    let Some(value) = headers.get(MCP_SESSION_ID) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|_| Error::MalformedSessionId)?;
    SessionId::try_from_string(text)
        .map(Some)
        .ok_or(Error::MalformedSessionId)
}

/// Read and parse the `Last-Event-ID` header, if present.
pub fn last_event_id_header(headers: &HeaderMap) -> Result<Option<u64>> {
    let Some(value) = headers.get(LAST_EVENT_ID) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|_| Error::MalformedLastEventId)?;
    text.parse().map(Some).map_err(|_| Error::MalformedLastEventId)
}

/// Whether the `Accept` header indicates the client will take an SSE stream.
pub fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}
