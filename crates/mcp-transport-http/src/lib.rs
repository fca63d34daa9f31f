//! Streaming HTTP transport: a single `/mcp` endpoint serving POST (request
//! or notification), GET (server-push SSE with `Last-Event-ID` resume), and
//! DELETE (session termination), wired over the same [`mcp_protocol::ProtocolCore`]
//! the stdio transport uses.

pub mod config;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod run;
pub mod router;
pub mod state;

pub use config::{HttpTransportConfig, HttpTransportConfigBuilder};
pub use error::{Error, Result};
pub use router::build_router;
pub use run::run_server;
pub use state::AppState;
