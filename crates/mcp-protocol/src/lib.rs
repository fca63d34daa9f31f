//! The MCP protocol core: handshake lifecycle, method dispatch, and the
//! tool/prompt/resource registries shared by both transports.

pub mod dispatch;
pub mod error;
pub mod registry;
pub mod router;
pub mod types;

pub use dispatch::{ProtocolCore, PromptHandler, RequestContext, ResourceHandler, ToolHandler};
pub use error::{Error, Result};
pub use registry::{ListFilter, Registry};
pub use router::{not_initialized_error, route_notification, route_request};
pub use types::{
    negotiate_protocol_version, ClientCapabilities, Implementation, InitializeParams,
    InitializeResult, ServerCapabilities, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
