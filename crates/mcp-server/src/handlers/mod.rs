//! Illustrative default tool/prompt/resource handlers, registered by
//! [`crate::McpServerBuilder::with_example_handlers`] and used directly by
//! the end-to-end scenarios in this crate's tests. Not new protocol
//! features — just the smallest handlers that exercise each registry.

pub mod echo;
pub mod greeting;
pub mod memo;

pub use echo::EchoTool;
pub use greeting::GreetingPrompt;
pub use memo::MemoResource;
