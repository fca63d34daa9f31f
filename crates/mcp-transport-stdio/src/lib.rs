//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Unlike the HTTP transport, stdio exposes no session concept to the
//! client at all: there is exactly one peer, exactly one connection, and no
//! `Mcp-Session-Id` header to bind to. Internally this module still opens a
//! single [`mcp_session::SessionId`] against the shared [`ProtocolCore`] so
//! the same handshake/dispatch/notification machinery serves both
//! transports; it is simply never surfaced on the wire.

pub mod error;
pub mod run;

pub use error::{Error, Result};
pub use run::{run, run_with_io};
