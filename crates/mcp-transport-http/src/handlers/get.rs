//! GET handler: opens a long-lived SSE stream of server-initiated traffic.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use mcp_session::BusMessage;

use crate::error::{Error, Result};
use crate::headers::{accepts_event_stream, last_event_id_header, session_id_header};
use crate::state::AppState;

/// `GET /mcp`: server push. Carries notifications and server-originated
/// requests queued for the session named by `Mcp-Session-Id`. A
/// `Last-Event-ID` header resumes from the event log's strict suffix after
/// that id; otherwise only events appended after this stream attaches are
/// delivered.
pub async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    if !accepts_event_stream(&headers) {
        return Err(Error::SseNotAccepted);
    }
    let session_id = session_id_header(&headers)?.ok_or(Error::MissingSessionId)?;
    let requested_last_event_id = last_event_id_header(&headers)?;

    let initial_cursor = match requested_last_event_id {
        Some(id) => Some(id),
        None => state.core.latest_event_id(&session_id),
    };
    let replay = match requested_last_event_id {
        Some(id) => state.core.events_since(&session_id, Some(id))?,
        None => Vec::new(),
    };

    let core = state.core;
    let keep_alive = state.config.keep_alive;

    let stream = async_stream::stream! {
        let mut cursor = initial_cursor;
        for event in replay {
            cursor = Some(event.id);
            yield Ok::<Event, Infallible>(Event::default().id(event.id.to_string()).data(event.data));
        }

        loop {
            match core.next_outbound(&session_id).await {
                BusMessage::Notification(_) => {
                    let fresh = match core.events_since(&session_id, cursor) {
                        Ok(events) => events,
                        Err(err) => {
                            tracing::warn!(target: "mcp_transport_http::get", %err, "failed to read event log");
                            continue;
                        }
                    };
                    for event in fresh {
                        cursor = Some(event.id);
                        yield Ok(Event::default().id(event.id.to_string()).data(event.data));
                    }
                }
                BusMessage::Response(payload) => {
                    yield Ok(Event::default().data(payload.to_string()));
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive)))
}
