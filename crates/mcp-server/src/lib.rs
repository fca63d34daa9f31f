//! Facade crate: an `McpServerBuilder` that wires the session layer, the
//! protocol core, both transports, and (optionally) the OAuth
//! resource-server middleware into one server, plus the illustrative
//! default tool/prompt/resource handlers used by its integration tests.
//!
//! Grounded on `turbomcp-server`'s own `server::{builder, core}` split;
//! the teacher's `transport`/`shutdown`/`middleware`/`routing` modules have
//! no counterpart here because those concerns already live in
//! `mcp-transport-http`, `mcp-transport-stdio`, and `mcp-auth`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{Error, Result};
pub use handlers::{EchoTool, GreetingPrompt, MemoResource};
pub use server::{McpServer, McpServerBuilder};
