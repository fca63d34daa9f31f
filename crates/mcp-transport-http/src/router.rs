//! Axum router wiring for the single unified MCP endpoint.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use mcp_protocol::ProtocolCore;

use crate::config::HttpTransportConfig;
use crate::handlers::{delete_handler, get_handler, post_handler};
use crate::state::AppState;

/// Build the axum router serving GET/POST/DELETE on `config.endpoint_path`.
pub fn build_router(core: Arc<ProtocolCore>, config: HttpTransportConfig) -> Router {
    let state = AppState { core, config: config.clone() };

    Router::new()
        .route(
            &config.endpoint_path,
            get(get_handler).post(post_handler).delete(delete_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mcp_protocol::{Implementation, ServerCapabilities};
    use mcp_session::{CorrelationTable, EventLog, InMemorySessionStore, NotificationBus, SessionStore};
    use tower::ServiceExt;

    fn test_core() -> Arc<ProtocolCore> {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        Arc::new(ProtocolCore::new(
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
        ))
    }

    #[tokio::test]
    async fn initialize_assigns_a_session_header() {
        let app = build_router(test_core(), HttpTransportConfig::default());
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-06-18",
                "capabilities": {},
                "clientInfo": {"name": "c", "version": "1"}
            }
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("Mcp-Session-Id").is_some());
    }

    #[tokio::test]
    async fn request_with_no_session_header_is_rejected_when_stateful() {
        let app = build_router(test_core(), HttpTransportConfig::default());
        let body = serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_is_idempotent_for_unknown_session() {
        let app = build_router(test_core(), HttpTransportConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/mcp")
                    .header("Mcp-Session-Id", "mcp-does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
