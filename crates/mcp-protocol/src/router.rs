//! Routes a decoded [`mcp_core::Message`] to the matching [`ProtocolCore`] operation.
//!
//! This is the single place method names are matched against handlers, kept
//! separate from [`ProtocolCore`] itself so the wire-level dispatch table
//! and the underlying operations it calls can be read independently.

use mcp_core::{ErrorResponse, JsonRpcErrorCode, Message, Request, Response, RpcError};
use mcp_session::SessionId;
use serde_json::{json, Value};

use crate::dispatch::{ProtocolCore, RequestContext};
use crate::error::Error;
use crate::types::InitializeParams;

/// Route one incoming request and produce its response, if any.
///
/// Notifications never produce a response (`Ok(None)`); `initialize` and
/// the built-in listing/invocation methods do. Unknown methods produce a
/// `Method not found` error response rather than being silently dropped.
pub async fn route_request(
    core: &ProtocolCore,
    session_id: &SessionId,
    request: Request,
) -> Message {
    let ctx = RequestContext::for_session(session_id.clone());
    let result = dispatch_method(core, session_id, &ctx, &request.method, request.params).await;

    match result {
        Ok(value) => Message::Response(Response::new(request.id, value)),
        Err(err) => {
            Message::ErrorResponse(ErrorResponse::new(request.id, ProtocolCore::to_rpc_error(&err)))
        }
    }
}

/// Route an incoming notification. Returns `Ok(())` even for unknown
/// methods: per JSON-RPC, a notification never gets a response of any kind,
/// so an unrecognized one is just logged and dropped, not errored back.
pub async fn route_notification(core: &ProtocolCore, session_id: &SessionId, method: &str) {
    if method == "notifications/initialized" {
        if let Err(err) = core.mark_initialized(session_id).await {
            tracing::warn!(target: "mcp_protocol::router", session = %session_id, %err, "failed to activate session");
        }
    } else {
        tracing::debug!(target: "mcp_protocol::router", method, "unhandled notification");
    }
}

async fn dispatch_method(
    core: &ProtocolCore,
    session_id: &SessionId,
    ctx: &RequestContext,
    method: &str,
    params: Option<Value>,
) -> Result<Value, Error> {
    match method {
        "initialize" => {
            let params: InitializeParams = parse_params(params)?;
            let result = core.initialize(session_id, params).await?;
            Ok(serde_json::to_value(result).expect("InitializeResult always serializes"))
        }
        "ping" => Ok(core.ping()),
        "tools/list" => Ok(json!({ "tools": core.list_tools(ctx).await })),
        "tools/call" => {
            let params = params.ok_or_else(|| Error::InvalidParams("missing params".into()))?;
            let name = require_str(&params, "name")?;
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            core.call_tool(name, arguments, ctx).await
        }
        "prompts/list" => Ok(json!({ "prompts": core.list_prompts(ctx).await })),
        "prompts/get" => {
            let params = params.ok_or_else(|| Error::InvalidParams("missing params".into()))?;
            let name = require_str(&params, "name")?;
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            core.get_prompt(name, arguments, ctx).await
        }
        "resources/list" => Ok(json!({ "resources": core.list_resources(ctx).await })),
        "resources/templates/list" => Ok(json!({ "resourceTemplates": Vec::<Value>::new() })),
        "resources/read" => {
            let params = params.ok_or_else(|| Error::InvalidParams("missing params".into()))?;
            let uri = require_str(&params, "uri")?;
            core.read_resource(uri, ctx).await
        }
        "completion/complete" => Ok(json!({ "completion": { "values": Vec::<String>::new(), "hasMore": false } })),
        "logging/setLevel" => Ok(json!({})),
        other => Err(Error::MethodNotFound(other.to_string())),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, Error> {
    let params = params.ok_or_else(|| Error::InvalidParams("missing params".into()))?;
    serde_json::from_value(params).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn require_str<'a>(params: &'a Value, field: &str) -> Result<&'a str, Error> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidParams(format!("missing or non-string `{field}`")))
}

/// Build the `RpcError` clients receive for a request that arrived before
/// `initialize` completed. Exposed for transports that need to reject a
/// request without going through [`route_request`] (e.g. a raw HTTP POST
/// whose session lookup already failed).
pub fn not_initialized_error() -> RpcError {
    RpcError::with_message(JsonRpcErrorCode::InvalidRequest, Error::NotInitialized.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientCapabilities, Implementation, ServerCapabilities};
    use mcp_core::RequestId;
    use mcp_session::{CorrelationTable, EventLog, InMemorySessionStore, NotificationBus, SessionStore};
    use std::sync::Arc;

    async fn core_with_session() -> (ProtocolCore, SessionId) {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let session_id = sessions.create().await.unwrap();
        let core = ProtocolCore::new(
            Implementation {
                name: "test".into(),
                title: None,
                version: "0.1".into(),
            },
            ServerCapabilities::default(),
            sessions,
            Arc::new(NotificationBus::new(16)),
            Arc::new(CorrelationTable::new()),
            Arc::new(EventLog::new(16)),
        );
        (core, session_id)
    }

    #[tokio::test]
    async fn routes_initialize_to_a_response() {
        let (core, session_id) = core_with_session().await;
        let request = Request::new(
            "initialize",
            Some(serde_json::to_value(InitializeParams {
                protocol_version: "2025-06-18".into(),
                capabilities: ClientCapabilities::default(),
                client_info: Implementation {
                    name: "c".into(),
                    title: None,
                    version: "1".into(),
                },
            })
            .unwrap()),
            RequestId::Number(1),
        );

        let response = route_request(&core, &session_id, request).await;
        assert!(matches!(response, Message::Response(_)));
    }

    #[tokio::test]
    async fn unknown_method_produces_method_not_found() {
        let (core, session_id) = core_with_session().await;
        let request = Request::new("nonexistent/method", None, RequestId::Number(1));

        let response = route_request(&core, &session_id, request).await;
        match response {
            Message::ErrorResponse(err) => assert_eq!(err.error.code, JsonRpcErrorCode::MethodNotFound.code()),
            _ => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn ping_round_trips() {
        let (core, session_id) = core_with_session().await;
        let request = Request::new("ping", None, RequestId::String("p1".into()));
        let response = route_request(&core, &session_id, request).await;
        assert!(matches!(response, Message::Response(_)));
    }
}
