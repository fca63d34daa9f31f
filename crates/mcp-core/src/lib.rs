//! Wire-level primitives shared by every other crate in the workspace:
//! JSON-RPC 2.0 message framing, SSE encode/decode, stdio line framing, and
//! the crate-wide error type.

pub mod error;
pub mod jsonrpc;
pub mod sse;
pub mod stdio;

pub use error::{Error, JsonRpcErrorCode, Result, RpcError};
pub use jsonrpc::{ErrorResponse, Message, Notification, Request, RequestId, Response};
pub use sse::{SseEncoder, SseEvent, SseEventBuilder, SseParser};
