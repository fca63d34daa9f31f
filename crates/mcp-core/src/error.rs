//! Crate-wide error type and JSON-RPC error-code mapping.

use serde::{Deserialize, Serialize};

/// Result alias used throughout `mcp-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while framing or decoding MCP wire messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload was not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload was valid JSON but not a well-formed JSON-RPC message.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An SSE frame was malformed (missing `data:` field, bad `id:`, etc).
    #[error("invalid SSE frame: {0}")]
    InvalidSse(String),

    /// A stdio line was not valid UTF-8.
    #[error("invalid stdio line: {0}")]
    InvalidStdio(String),
}

/// Standard JSON-RPC 2.0 error codes plus the `-32000..-32099` application range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    /// Invalid JSON was received (-32700).
    ParseError,
    /// The JSON sent is not a valid request object (-32600).
    InvalidRequest,
    /// The method does not exist / is not available (-32601).
    MethodNotFound,
    /// Invalid method parameter(s) (-32602).
    InvalidParams,
    /// Internal JSON-RPC error (-32603).
    InternalError,
    /// Server/application-defined error in the -32000..-32099 range.
    ApplicationError(i32),
}

impl JsonRpcErrorCode {
    /// The numeric JSON-RPC error code.
    pub fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ApplicationError(code) => code,
        }
    }

    /// The standard message associated with the code.
    pub fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ApplicationError(_) => "Application error",
        }
    }
}

impl From<i32> for JsonRpcErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            other => Self::ApplicationError(other),
        }
    }
}

/// JSON-RPC error object, embeddable in an [`crate::jsonrpc::ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable message.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Build an error object from a standard code with no extra data.
    pub fn new(code: JsonRpcErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data: None,
        }
    }

    /// Build an error object from a standard code with a custom message.
    pub fn with_message(code: JsonRpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
