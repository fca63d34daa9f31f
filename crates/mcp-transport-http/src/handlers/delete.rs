//! DELETE handler: terminates the session named by `Mcp-Session-Id`.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::headers::session_id_header;
use crate::state::AppState;

/// `DELETE /mcp`: idempotent session termination. Returns 200 whether or
/// not the session id was known, per spec; 400 if the header is missing or malformed.
pub async fn delete_handler(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let session_id = match session_id_header(&headers) {
        Ok(Some(id)) => id,
        Ok(None) => return StatusCode::BAD_REQUEST,
        Err(_) => return StatusCode::BAD_REQUEST,
    };

    match state.core.terminate_session(&session_id).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(target: "mcp_transport_http::delete", %err, "failed to terminate session");
            StatusCode::OK
        }
    }
}
