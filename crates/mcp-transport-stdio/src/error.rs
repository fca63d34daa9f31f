//! Error type for the stdio transport.

/// Result alias used throughout `mcp-transport-stdio`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while running the stdio transport loop.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Reading a line from the input stream failed.
    #[error("stdio read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Writing a line to the output stream failed.
    #[error("stdio write failed: {0}")]
    Write(#[source] std::io::Error),

    /// The implicit single session used by this transport could not be created.
    #[error(transparent)]
    Session(#[from] mcp_protocol::Error),
}
