//! Aggregate error type for the facade crate, following the teacher's
//! per-crate `XxxError` pattern (`turbomcp-server::error::ServerError`) —
//! one variant per collaborator crate, `#[from]` at every boundary.

/// Result alias used throughout `mcp-server`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or running an [`crate::McpServer`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The protocol core rejected an operation.
    #[error(transparent)]
    Protocol(#[from] mcp_protocol::Error),

    /// The streaming HTTP transport failed.
    #[error(transparent)]
    Http(#[from] mcp_transport_http::Error),

    /// The stdio transport failed.
    #[error(transparent)]
    Stdio(#[from] mcp_transport_stdio::Error),

    /// Binding the listener for a manually-wrapped HTTP router failed.
    #[error("HTTP server failed: {0}")]
    Io(#[from] std::io::Error),
}
