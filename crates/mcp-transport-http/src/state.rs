//! Shared axum handler state.

use std::sync::Arc;

use mcp_protocol::ProtocolCore;

use crate::config::HttpTransportConfig;

/// State threaded into every axum handler on the MCP endpoint.
#[derive(Clone)]
pub struct AppState {
    /// The wired protocol core (sessions, registries, dispatch).
    pub core: Arc<ProtocolCore>,
    /// Transport-level configuration.
    pub config: HttpTransportConfig,
}
