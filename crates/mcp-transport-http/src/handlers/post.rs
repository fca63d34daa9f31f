//! POST handler: accepts one JSON-RPC message per request body.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use mcp_core::Message;
use mcp_session::{CorrelationId, SessionId};
use serde_json::json;

use crate::error::{Error, Result};
use crate::headers::{accepts_event_stream, session_id_header, MCP_SESSION_ID};
use crate::state::AppState;

/// `POST /mcp`: accepts a single JSON-RPC request, notification, or response.
///
/// - A request answers either as a plain JSON body or, if the client's
///   `Accept` includes `text/event-stream`, as a one-event SSE stream
///   carrying the same response.
/// - A notification or a reply to a server-originated request is accepted
///   and acknowledged with 202; it never produces a JSON-RPC response.
pub async fn post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let message = Message::decode(
        std::str::from_utf8(&body).map_err(|_| Error::Message(mcp_core::Error::InvalidRequest("body is not valid UTF-8".into())))?,
    )?;

    if let Message::Request(request) = &message {
        if request.method == "initialize" {
            let session_id = state.core.create_session().await?;
            let reply = mcp_protocol::route_request(&state.core, &session_id, request.clone()).await;
            return Ok(respond_json(&session_id, reply));
        }
    }

    let session_id = resolve_session_id(&state, &headers).await?;

    match message {
        Message::Request(request) => {
            if accepts_event_stream(&headers) {
                Ok(respond_sse(state, session_id, request).await)
            } else {
                let reply = mcp_protocol::route_request(&state.core, &session_id, request).await;
                Ok(respond_json(&session_id, reply))
            }
        }
        Message::Notification(notification) => {
            mcp_protocol::route_notification(&state.core, &session_id, &notification.method).await;
            Ok(accepted(&session_id))
        }
        Message::Response(response) => {
            deliver_reply(&state, &response.id, response.result);
            Ok(accepted(&session_id))
        }
        Message::ErrorResponse(error_response) => {
            let payload = serde_json::to_value(&error_response.error).unwrap_or(serde_json::Value::Null);
            deliver_reply(&state, &error_response.id, payload);
            Ok(accepted(&session_id))
        }
    }
}

async fn resolve_session_id(state: &AppState, headers: &HeaderMap) -> Result<SessionId> {
    match session_id_header(headers)? {
        Some(id) => Ok(id),
        None if state.config.stateless => Ok(SessionId::new()),
        None => Err(Error::MissingSessionId),
    }
}

fn deliver_reply(state: &AppState, id: &mcp_core::RequestId, payload: serde_json::Value) {
    let Some(correlation_id) = CorrelationId::parse(&id.to_string()) else {
        tracing::warn!(target: "mcp_transport_http::post", id = %id, "reply id is not a known correlation slot");
        return;
    };
    if let Err(err) = state.core.deliver_reply(correlation_id, payload) {
        tracing::warn!(target: "mcp_transport_http::post", %err, "failed to deliver correlated reply");
    }
}

fn respond_json(session_id: &SessionId, reply: Message) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        MCP_SESSION_ID,
        HeaderValue::from_str(session_id.as_str()).expect("session ids are header-safe"),
    );
    (StatusCode::OK, headers, Json(reply.to_value())).into_response()
}

fn accepted(session_id: &SessionId) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        MCP_SESSION_ID,
        HeaderValue::from_str(session_id.as_str()).expect("session ids are header-safe"),
    );
    (StatusCode::ACCEPTED, headers, Json(json!({}))).into_response()
}

async fn respond_sse(state: AppState, session_id: SessionId, request: mcp_core::Request) -> Response {
    let core = state.core;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
    let header_session_id = session_id.clone();

    tokio::spawn(async move {
        let reply = mcp_protocol::route_request(&core, &session_id, request).await;
        let _ = tx.send(reply);
    });

    let keep_alive = state.config.keep_alive;
    let stream = async_stream::stream! {
        if let Some(reply) = rx.recv().await {
            yield Ok::<Event, Infallible>(Event::default().data(reply.to_value().to_string()));
        }
    };

    let mut response = Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive)).into_response();
    response.headers_mut().insert(
        MCP_SESSION_ID,
        HeaderValue::from_str(header_session_id.as_str()).expect("session ids are header-safe"),
    );
    response
}
