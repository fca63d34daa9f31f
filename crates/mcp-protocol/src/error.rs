//! Error type for protocol-core operations: lifecycle violations, dispatch failures.

/// Result alias used throughout `mcp-protocol`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while negotiating a session or dispatching a method.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A request arrived before `initialize` completed the handshake.
    #[error("session is not initialized")]
    NotInitialized,

    /// `initialize` was called on a session that already completed the handshake.
    #[error("session is already initialized")]
    AlreadyInitialized,

    /// No protocol version offered by the client is supported by this server.
    #[error("unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(String),

    /// The requested method has no registered handler.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// `params` was missing or failed to deserialize into the handler's expected shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// No tool/prompt/resource is registered under the given name.
    #[error("unknown {kind}: {name}")]
    NotRegistered {
        /// `"tool"`, `"prompt"`, or `"resource"`.
        kind: &'static str,
        /// The requested name or URI.
        name: String,
    },

    /// A handler returned an application-level failure.
    #[error("handler error: {0}")]
    Handler(String),

    /// Wraps a session-layer failure (store/bus/correlation/log).
    #[error(transparent)]
    Session(#[from] mcp_session::Error),

    /// Wraps a core framing failure.
    #[error(transparent)]
    Core(#[from] mcp_core::Error),
}

impl Error {
    /// Map this error to the JSON-RPC error code the spec assigns it.
    pub fn rpc_code(&self) -> mcp_core::JsonRpcErrorCode {
        use mcp_core::JsonRpcErrorCode as Code;
        match self {
            Self::MethodNotFound(_) => Code::MethodNotFound,
            Self::InvalidParams(_) | Self::NotRegistered { .. } => Code::InvalidParams,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::UnsupportedProtocolVersion(_) => Code::InvalidRequest,
            Self::Handler(_) | Self::Session(_) | Self::Core(_) => Code::InternalError,
        }
    }
}
