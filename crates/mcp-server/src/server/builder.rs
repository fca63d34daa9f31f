//! Fluent builder for constructing an [`McpServer`](super::core::McpServer),
//! grounded on `turbomcp-server::server::builder::ServerBuilder`.

use std::sync::Arc;

use mcp_auth::{ResourceServerConfig, TokenVerifier};
use mcp_protocol::types::{ListChangedCapability, ResourcesCapability};
use mcp_protocol::{Implementation, ProtocolCore, PromptHandler, ResourceHandler, ServerCapabilities, ToolHandler};
use mcp_session::{CorrelationTable, EventLog, InMemorySessionStore, NotificationBus, NullSessionStore, SessionStore};
use mcp_transport_http::HttpTransportConfig;

use crate::handlers::{EchoTool, GreetingPrompt, MemoResource};

use super::core::McpServer;

const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;
const DEFAULT_EVENT_LOG_CAPACITY: usize = 256;

/// Builds an [`McpServer`] by wiring the session layer, the protocol core,
/// the transport configuration, and (optionally) the resource-server
/// middleware together.
pub struct McpServerBuilder {
    name: String,
    title: Option<String>,
    version: String,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    stateless: bool,
    notification_capacity: usize,
    event_log_capacity: usize,
    http_config: HttpTransportConfig,
    resource_server: Option<(ResourceServerConfig, Arc<TokenVerifier>)>,
    tools: Vec<(String, Arc<dyn ToolHandler>)>,
    prompts: Vec<(String, Arc<dyn PromptHandler>)>,
    resources: Vec<(String, Arc<dyn ResourceHandler>)>,
}

impl McpServerBuilder {
    /// A builder for a server named `name` at `version`, stateful by
    /// default, with no tools/prompts/resources registered yet.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            version: version.into(),
            capabilities: ServerCapabilities::default(),
            instructions: None,
            stateless: false,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            http_config: HttpTransportConfig::default(),
            resource_server: None,
            tools: Vec::new(),
            prompts: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Set the display title returned in `initialize`'s `serverInfo`.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the free-form usage instructions returned in `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Run without a session store: every non-`initialize` request rides an
    /// ephemeral session and server-originated requests (`roots/list`,
    /// sampling) fail with [`mcp_session::Error::StatelessMode`].
    pub fn stateless(mut self, stateless: bool) -> Self {
        self.stateless = stateless;
        self
    }

    /// Override the streaming HTTP transport's configuration (default:
    /// `127.0.0.1:8080`, `/mcp`, stateful).
    pub fn with_http_config(mut self, config: HttpTransportConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the per-session outbound notification queue's capacity
    /// (default 256).
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    /// Override the per-session replayable event log's retained capacity
    /// (default 256).
    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = capacity;
        self
    }

    /// Gate every request on the streaming HTTP transport behind the
    /// resource-server bearer middleware (§4.8), verifying tokens with
    /// `verifier` against `config`'s scope/audience/issuer requirements.
    pub fn with_resource_server(mut self, config: ResourceServerConfig, verifier: Arc<TokenVerifier>) -> Self {
        self.resource_server = Some((config, verifier));
        self
    }

    /// Register a tool under `name`.
    pub fn tool(mut self, name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        self.tools.push((name.into(), Arc::new(handler) as Arc<dyn ToolHandler>));
        self
    }

    /// Register a prompt under `name`.
    pub fn prompt(mut self, name: impl Into<String>, handler: impl PromptHandler + 'static) -> Self {
        self.prompts.push((name.into(), Arc::new(handler) as Arc<dyn PromptHandler>));
        self
    }

    /// Register a resource under `uri`.
    pub fn resource(mut self, uri: impl Into<String>, handler: impl ResourceHandler + 'static) -> Self {
        self.resources.push((uri.into(), Arc::new(handler) as Arc<dyn ResourceHandler>));
        self
    }

    /// Register the illustrative `echo` tool, `greeting` prompt, and
    /// `memo://insights` resource used by the doc examples and this crate's
    /// integration tests.
    pub fn with_example_handlers(self) -> Self {
        self.tool("echo", EchoTool)
            .prompt("greeting", GreetingPrompt)
            .resource("memo://insights", MemoResource::default())
    }

    /// Assemble the session layer and protocol core and produce the server.
    pub fn build(self) -> McpServer {
        let sessions: Arc<dyn SessionStore> = if self.stateless {
            Arc::new(NullSessionStore)
        } else {
            Arc::new(InMemorySessionStore::new())
        };
        let bus = Arc::new(NotificationBus::new(self.notification_capacity));
        let correlation = Arc::new(CorrelationTable::new());
        let events = Arc::new(EventLog::new(self.event_log_capacity));

        let mut capabilities = self.capabilities;
        if !self.tools.is_empty() {
            capabilities.tools = Some(ListChangedCapability::default());
        }
        if !self.prompts.is_empty() {
            capabilities.prompts = Some(ListChangedCapability::default());
        }
        if !self.resources.is_empty() {
            capabilities.resources = Some(ResourcesCapability::default());
        }

        let mut core = ProtocolCore::new(
            Implementation {
                name: self.name,
                title: self.title,
                version: self.version,
            },
            capabilities,
            sessions,
            bus,
            correlation,
            events,
        );
        if let Some(instructions) = self.instructions {
            core = core.with_instructions(instructions);
        }

        for (name, handler) in self.tools {
            core.tools_mut().register(name, handler);
        }
        for (name, handler) in self.prompts {
            core.prompts_mut().register(name, handler);
        }
        for (uri, handler) in self.resources {
            core.resources_mut().register(uri, handler);
        }

        McpServer::new(Arc::new(core), self.http_config, self.resource_server, self.stateless)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn example_handlers_populate_capabilities_and_registries() {
        let server = McpServerBuilder::new("test-server", "0.1.0")
            .with_example_handlers()
            .build();

        let ctx = mcp_protocol::RequestContext::default();
        let core = server.protocol_core();
        assert_eq!(core.list_tools(&ctx).await.len(), 1);
        assert_eq!(core.list_prompts(&ctx).await.len(), 1);
        assert_eq!(core.list_resources(&ctx).await.len(), 1);
    }

    #[test]
    fn stateless_builder_installs_null_session_store() {
        let server = McpServerBuilder::new("test-server", "0.1.0")
            .stateless(true)
            .build();
        assert!(server.is_stateless());
    }
}
