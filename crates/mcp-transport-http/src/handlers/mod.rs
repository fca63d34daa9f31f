//! The three HTTP methods the MCP endpoint serves.

pub mod delete;
pub mod get;
pub mod post;

pub use delete::delete_handler;
pub use get::get_handler;
pub use post::post_handler;
