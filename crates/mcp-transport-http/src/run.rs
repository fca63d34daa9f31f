//! Binds and serves the MCP endpoint router until the process is killed.

use std::sync::Arc;

use mcp_protocol::ProtocolCore;

use crate::config::HttpTransportConfig;
use crate::error::Result;
use crate::router::build_router;

/// Bind `config.bind_addr` and serve the MCP endpoint until the listener is closed.
pub async fn run_server(core: Arc<ProtocolCore>, config: HttpTransportConfig) -> Result<()> {
    let bind_addr = config.bind_addr.clone();
    let endpoint_path = config.endpoint_path.clone();
    let app = build_router(core, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(bind_addr, endpoint_path, "streaming HTTP transport ready");
    axum::serve(listener, app).await?;
    Ok(())
}
