//! The server facade: builder plus the assembled server it produces.

pub mod builder;
pub mod core;

pub use builder::McpServerBuilder;
pub use core::McpServer;
