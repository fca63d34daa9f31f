//! The assembled server: a protocol core plus the transport and
//! resource-server configuration needed to serve it, grounded on
//! `turbomcp-server::server::core::McpServer`.

use std::sync::Arc;

use axum::Router;
use mcp_auth::middleware::{require_bearer_token, ResourceServerState};
use mcp_auth::{ResourceServerConfig, TokenVerifier};
use mcp_protocol::ProtocolCore;
use mcp_transport_http::HttpTransportConfig;

use crate::error::{Error, Result};

/// A fully wired MCP server: protocol core, HTTP transport configuration,
/// and an optional resource-server bearer-token gate.
///
/// Construct one with [`McpServerBuilder`](super::builder::McpServerBuilder).
pub struct McpServer {
    core: Arc<ProtocolCore>,
    http_config: HttpTransportConfig,
    resource_server: Option<(ResourceServerConfig, Arc<TokenVerifier>)>,
    stateless: bool,
}

impl McpServer {
    pub(super) fn new(
        core: Arc<ProtocolCore>,
        http_config: HttpTransportConfig,
        resource_server: Option<(ResourceServerConfig, Arc<TokenVerifier>)>,
        stateless: bool,
    ) -> Self {
        Self {
            core,
            http_config,
            resource_server,
            stateless,
        }
    }

    /// The wired protocol core, for embedding in a custom transport or for
    /// tests that drive `initialize`/`tools/call` directly.
    pub fn protocol_core(&self) -> &Arc<ProtocolCore> {
        &self.core
    }

    /// Whether this server was built with [`McpServerBuilder::stateless`](super::builder::McpServerBuilder::stateless).
    pub fn is_stateless(&self) -> bool {
        self.stateless
    }

    /// Build the axum router serving the streaming HTTP transport, wrapped
    /// in the resource-server bearer middleware if one was configured.
    pub fn http_router(&self) -> Router {
        let router = mcp_transport_http::build_router(self.core.clone(), self.http_config.clone());
        match &self.resource_server {
            Some((config, verifier)) => {
                let state = ResourceServerState {
                    config: config.clone(),
                    verifier: verifier.clone(),
                };
                router.layer(axum::middleware::from_fn_with_state(state, require_bearer_token))
            }
            None => router,
        }
    }

    /// Bind `http_config.bind_addr` and serve the (possibly auth-gated)
    /// streaming HTTP transport until the listener is closed.
    pub async fn run_http(&self) -> Result<()> {
        let bind_addr = self.http_config.bind_addr.clone();
        let endpoint_path = self.http_config.endpoint_path.clone();
        let app = self.http_router();

        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        tracing::info!(bind_addr, endpoint_path, auth_gated = self.resource_server.is_some(), "mcp server ready");
        axum::serve(listener, app).await.map_err(Error::Io)
    }

    /// Run the newline-delimited stdio transport against the process's
    /// real stdin/stdout until input closes.
    pub async fn run_stdio(&self) -> Result<()> {
        mcp_transport_stdio::run(self.core.clone()).await.map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::McpServerBuilder;
    use tower::ServiceExt;

    #[tokio::test]
    async fn http_router_serves_initialize_without_auth_configured() {
        let server = McpServerBuilder::new("test-server", "0.1.0")
            .with_example_handlers()
            .build();
        let app = server.http_router();

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
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn http_router_rejects_unauthenticated_requests_when_resource_server_configured() {
        use mcp_auth::{ResourceServerConfig, TokenVerifier};
        use std::sync::Arc;

        let verifier = Arc::new(TokenVerifier::LocalJwks(mcp_auth::jwt::JwtValidator::local(
            "https://as.example.com",
            jsonwebtoken::jwk::JwkSet { keys: Vec::new() },
        )));
        let server = McpServerBuilder::new("test-server", "0.1.0")
            .with_example_handlers()
            .with_resource_server(ResourceServerConfig::new(), verifier)
            .build();
        let app = server.http_router();

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
