//! Request context, tool/prompt/resource handler traits, and method dispatch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use mcp_core::RpcError;
use mcp_session::{
    BusMessage, CorrelationTable, EventLog, NotificationBus, Session, SessionId, SessionStore,
    StoredEvent,
};

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::types::{
    negotiate_protocol_version, ClientCapabilities, InitializeParams, InitializeResult,
    Implementation, ServerCapabilities,
};

/// Context threaded through every handler invocation.
///
/// Carries the originating session (absent in stateless mode) and any
/// caller metadata a transport or auth middleware chose to attach (e.g. the
/// verified token's subject, used by list filters for per-caller visibility).
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The session this request arrived on, if the server is stateful.
    pub session_id: Option<SessionId>,
    /// Arbitrary caller metadata attached upstream (auth claims, request id, ...).
    pub meta: Value,
}

impl RequestContext {
    /// Build a context bound to a specific session.
    pub fn for_session(session_id: SessionId) -> Self {
        Self {
            session_id: Some(session_id),
            meta: Value::Null,
        }
    }
}

/// Definition and executable behavior of one registered tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The tool's `tools/list` definition (name, description, JSON-schema input shape).
    fn definition(&self) -> Value;

    /// Execute the tool against `arguments`.
    async fn call(&self, arguments: Value, ctx: &RequestContext) -> Result<Value>;
}

/// Definition and executable behavior of one registered prompt.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    /// The prompt's `prompts/list` definition.
    fn definition(&self) -> Value;

    /// Render the prompt against `arguments`.
    async fn get(&self, arguments: Value, ctx: &RequestContext) -> Result<Value>;
}

/// Definition and executable behavior of one registered resource.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The resource's `resources/list` definition (uri, name, mime type).
    fn definition(&self) -> Value;

    /// Read the resource's current contents.
    async fn read(&self, ctx: &RequestContext) -> Result<Value>;
}

/// Wires the session layer, the three registries, and built-in method
/// dispatch into one callable surface shared by every transport.
pub struct ProtocolCore {
    server_info: Implementation,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    tools: Registry<Arc<dyn ToolHandler>>,
    prompts: Registry<Arc<dyn PromptHandler>>,
    resources: Registry<Arc<dyn ResourceHandler>>,
    sessions: Arc<dyn SessionStore>,
    bus: Arc<NotificationBus>,
    correlation: Arc<CorrelationTable>,
    events: Arc<EventLog>,
    server_request_timeout: Duration,
}

impl ProtocolCore {
    /// Build a protocol core over the given session-layer components.
    pub fn new(
        server_info: Implementation,
        capabilities: ServerCapabilities,
        sessions: Arc<dyn SessionStore>,
        bus: Arc<NotificationBus>,
        correlation: Arc<CorrelationTable>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            server_info,
            capabilities,
            instructions: None,
            tools: Registry::new(),
            prompts: Registry::new(),
            resources: Registry::new(),
            sessions,
            bus,
            correlation,
            events,
            server_request_timeout: Duration::from_secs(30),
        }
    }

    /// Attach free-form usage instructions returned in `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Mutable access to the tool registry, for server setup.
    pub fn tools_mut(&mut self) -> &mut Registry<Arc<dyn ToolHandler>> {
        &mut self.tools
    }

    /// Mutable access to the prompt registry, for server setup.
    pub fn prompts_mut(&mut self) -> &mut Registry<Arc<dyn PromptHandler>> {
        &mut self.prompts
    }

    /// Mutable access to the resource registry, for server setup.
    pub fn resources_mut(&mut self) -> &mut Registry<Arc<dyn ResourceHandler>> {
        &mut self.resources
    }

    /// Create a new `Pending` session bound to this core's store.
    ///
    /// Used directly by transports (stdio has no session header to bind to,
    /// so it opens one implicit session per connection) as well as by the
    /// HTTP transport's session-creating POST handler.
    pub async fn create_session(&self) -> Result<SessionId> {
        self.sessions.create().await.map_err(Error::from)
    }

    /// Handle `initialize`: negotiate protocol version and return server info.
    ///
    /// `client_caps` is accepted but not yet validated against anything
    /// beyond being well-formed JSON; the handshake's purpose here is
    /// version negotiation and session activation, not capability gating.
    pub async fn initialize(
        &self,
        session_id: &SessionId,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::Session(mcp_session::Error::UnknownSession(session_id.to_string())))?;

        if matches!(session.state, mcp_session::SessionState::Active) {
            return Err(Error::AlreadyInitialized);
        }

        let negotiated = negotiate_protocol_version(&params.protocol_version);
        let mut updated = session;
        updated.protocol_version = Some(negotiated.clone());
        updated.client_info = Some(serde_json::to_value(&params.client_info).unwrap_or(Value::Null));
        self.sessions.update(updated).await?;

        debug!(
            target: "mcp_protocol::lifecycle",
            session = %session_id,
            requested = %params.protocol_version,
            negotiated = %negotiated,
            "handshake negotiated"
        );

        Ok(InitializeResult {
            protocol_version: negotiated,
            capabilities: self.capabilities.clone(),
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    /// Handle `notifications/initialized`: move the session to `Active`.
    pub async fn mark_initialized(&self, session_id: &SessionId) -> Result<()> {
        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::Session(mcp_session::Error::UnknownSession(session_id.to_string())))?;
        session.activate();
        self.sessions.update(session).await?;
        Ok(())
    }

    async fn require_active(&self, session_id: &SessionId) -> Result<Session> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::Session(mcp_session::Error::UnknownSession(session_id.to_string())))?;
        if !session.can_accept_requests() {
            return Err(Error::NotInitialized);
        }
        Ok(session)
    }

    /// `tools/list`.
    pub async fn list_tools(&self, ctx: &RequestContext) -> Vec<Value> {
        self.tools
            .list(ctx)
            .await
            .into_iter()
            .map(|(_, handler)| handler.definition())
            .collect()
    }

    /// `tools/call`.
    pub async fn call_tool(&self, name: &str, arguments: Value, ctx: &RequestContext) -> Result<Value> {
        let handler = self
            .tools
            .get(name)
            .ok_or_else(|| Error::NotRegistered {
                kind: "tool",
                name: name.to_string(),
            })?
            .clone();
        handler.call(arguments, ctx).await
    }

    /// `prompts/list`.
    pub async fn list_prompts(&self, ctx: &RequestContext) -> Vec<Value> {
        self.prompts
            .list(ctx)
            .await
            .into_iter()
            .map(|(_, handler)| handler.definition())
            .collect()
    }

    /// `prompts/get`.
    pub async fn get_prompt(&self, name: &str, arguments: Value, ctx: &RequestContext) -> Result<Value> {
        let handler = self
            .prompts
            .get(name)
            .ok_or_else(|| Error::NotRegistered {
                kind: "prompt",
                name: name.to_string(),
            })?
            .clone();
        handler.get(arguments, ctx).await
    }

    /// `resources/list`.
    pub async fn list_resources(&self, ctx: &RequestContext) -> Vec<Value> {
        self.resources
            .list(ctx)
            .await
            .into_iter()
            .map(|(_, handler)| handler.definition())
            .collect()
    }

    /// `resources/read`.
    pub async fn read_resource(&self, uri: &str, ctx: &RequestContext) -> Result<Value> {
        let handler = self
            .resources
            .get(uri)
            .ok_or_else(|| Error::NotRegistered {
                kind: "resource",
                name: uri.to_string(),
            })?
            .clone();
        handler.read(ctx).await
    }

    /// Originate a server→client request (`roots/list`, `sampling/createMessage`)
    /// and await the client's reply.
    ///
    /// The outgoing request is pushed onto the session's notification bus as
    /// a must-deliver item (never dropped under backpressure, unlike regular
    /// notifications) and the reply is awaited through the correlation table.
    /// Fails with [`mcp_session::Error::StatelessMode`] if no session store
    /// is configured, since there is no transport to carry the request back
    /// to a specific client without one.
    pub async fn originate_request(
        &self,
        session_id: &SessionId,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        self.require_active(session_id).await?;

        let waiter = self.correlation.begin();
        let request = mcp_core::Request::new(method, Some(params), waiter.id.to_string().into());
        let payload = mcp_core::Message::Request(request).to_value();

        self.bus
            .push_response(session_id, payload, self.server_request_timeout)
            .await?;

        waiter.recv().await.map_err(Error::from)
    }

    /// Deliver a client's reply to a previously-originated server request.
    pub fn deliver_reply(&self, correlation_id: mcp_session::CorrelationId, payload: Value) -> Result<()> {
        self.correlation.deliver(correlation_id, payload).map_err(Error::from)
    }

    /// `ping`: a liveness check with no payload.
    pub fn ping(&self) -> Value {
        json!({})
    }

    /// Map an [`Error`] to the JSON-RPC error object clients expect.
    pub fn to_rpc_error(err: &Error) -> RpcError {
        RpcError::with_message(err.rpc_code(), err.to_string())
    }

    /// Publish a one-way notification to a session's outbound stream.
    pub async fn notify(&self, session_id: &SessionId, method: &str, params: Value) {
        let notification = mcp_core::Notification::new(method, Some(params));
        let payload = mcp_core::Message::Notification(notification).to_value();
        let event_id = self.events.append(session_id, payload.to_string());
        debug!(target: "mcp_protocol::dispatch", session = %session_id, event_id, method, "queued notification");
        self.bus.push_notification(session_id, payload).await;
    }

    /// Drop a terminated session's queue and retained events.
    pub fn forget_session(&self, session_id: &SessionId) {
        self.bus.remove_session(session_id);
        self.events.remove_session(session_id);
    }

    /// Terminate a session outright: mark it `Terminated`, drop it from the
    /// store, and forget its queue and event log. Used by the HTTP
    /// transport's DELETE handler; idempotent if the session is unknown.
    pub async fn terminate_session(&self, session_id: &SessionId) -> Result<()> {
        if let Some(mut session) = self.sessions.get(session_id).await? {
            session.terminate();
            self.sessions.update(session).await?;
            self.sessions.delete(session_id).await?;
        }
        self.forget_session(session_id);
        Ok(())
    }

    /// Wait for the next outbound item (notification or correlated response)
    /// queued for a session. Used by the HTTP transport's GET/SSE stream to
    /// pull what `notify`/`originate_request` enqueued.
    pub async fn next_outbound(&self, session_id: &SessionId) -> BusMessage {
        self.bus.pop(session_id).await
    }

    /// A session's most recently appended event id, if any.
    pub fn latest_event_id(&self, session_id: &SessionId) -> Option<u64> {
        self.events.latest_id(session_id)
    }

    /// Events after `cursor` (or every retained event if `cursor` is `None`),
    /// for `Last-Event-ID` reconnection and for a fresh GET stream draining
    /// what accumulated between `latest_event_id` and attaching.
    pub fn events_since(&self, session_id: &SessionId, cursor: Option<u64>) -> Result<Vec<StoredEvent>> {
        self.events.since(session_id, cursor).map_err(Error::from)
    }

    /// Whether a session currently exists and can accept requests.
    pub async fn session_is_active(&self, session_id: &SessionId) -> Result<bool> {
        Ok(self
            .sessions
            .get(session_id)
            .await?
            .map(|s| s.can_accept_requests())
            .unwrap_or(false))
    }
}

/// Validate incoming client capabilities are at least well-formed.
///
/// Currently a structural no-op (any object deserializes); kept as a named
/// seam so future capability-gating policy has one place to land.
pub fn validate_client_capabilities(_caps: &ClientCapabilities) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_session::InMemorySessionStore;

    fn core() -> ProtocolCore {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        ProtocolCore::new(
            Implementation {
                name: "test-server".into(),
                title: None,
                version: "0.1.0".into(),
            },
            ServerCapabilities::default(),
            sessions,
            Arc::new(NotificationBus::new(16)),
            Arc::new(CorrelationTable::new()),
            Arc::new(EventLog::new(16)),
        )
    }

    #[tokio::test]
    async fn initialize_then_activate_round_trip() {
        let core = core();
        let session_id = core.sessions.create().await.unwrap();

        let result = core
            .initialize(
                &session_id,
                InitializeParams {
                    protocol_version: "2025-06-18".into(),
                    capabilities: ClientCapabilities::default(),
                    client_info: Implementation {
                        name: "test-client".into(),
                        title: None,
                        version: "1.0".into(),
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(result.protocol_version, "2025-06-18");

        core.mark_initialized(&session_id).await.unwrap();
        let session = core.sessions.get(&session_id).await.unwrap().unwrap();
        assert_eq!(session.state, mcp_session::SessionState::Active);
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let core = core();
        let session_id = core.sessions.create().await.unwrap();
        let params = InitializeParams {
            protocol_version: "2025-06-18".into(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "c".into(),
                title: None,
                version: "1".into(),
            },
        };
        core.initialize(&session_id, params.clone()).await.unwrap();
        core.mark_initialized(&session_id).await.unwrap();

        let second = core.initialize(&session_id, params).await;
        assert!(matches!(second, Err(Error::AlreadyInitialized)));
    }

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn definition(&self) -> Value {
            json!({"name": "echo"})
        }

        async fn call(&self, arguments: Value, _ctx: &RequestContext) -> Result<Value> {
            Ok(arguments)
        }
    }

    #[tokio::test]
    async fn call_unregistered_tool_errors() {
        let core = core();
        let ctx = RequestContext::default();
        let result = core.call_tool("missing", Value::Null, &ctx).await;
        assert!(matches!(result, Err(Error::NotRegistered { kind: "tool", .. })));
    }

    #[tokio::test]
    async fn registered_tool_is_listed_and_callable() {
        let mut core = core();
        core.tools_mut().register("echo", Arc::new(EchoTool) as Arc<dyn ToolHandler>);

        let ctx = RequestContext::default();
        let listed = core.list_tools(&ctx).await;
        assert_eq!(listed.len(), 1);

        let result = core.call_tool("echo", json!({"a": 1}), &ctx).await.unwrap();
        assert_eq!(result, json!({"a": 1}));
    }
}
