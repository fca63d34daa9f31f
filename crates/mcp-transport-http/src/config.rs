//! Builder-pattern configuration for the streaming HTTP transport.

use std::time::Duration;

/// Configuration for [`crate::router::build_router`].
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Address the server binds to.
    pub bind_addr: String,
    /// Path the MCP endpoint is served on.
    pub endpoint_path: String,
    /// Interval between SSE keep-alive comments on an idle GET stream.
    pub keep_alive: Duration,
    /// When `true`, a non-`initialize` request with no `Mcp-Session-Id`
    /// header is routed through a fresh, unpersisted session rather than
    /// rejected with 400. Mirrors spec's stateful-vs-stateless split.
    pub stateless: bool,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        HttpTransportConfigBuilder::new().build()
    }
}

/// Builder for [`HttpTransportConfig`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfigBuilder {
    bind_addr: String,
    endpoint_path: String,
    keep_alive: Duration,
    stateless: bool,
}

impl Default for HttpTransportConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransportConfigBuilder {
    /// Create a builder with sensible defaults: `127.0.0.1:8080`, `/mcp`,
    /// a 30 second keep-alive, stateful session handling.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            endpoint_path: "/mcp".to_string(),
            keep_alive: Duration::from_secs(30),
            stateless: false,
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the MCP endpoint path.
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Set the SSE keep-alive interval.
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Run without a `Mcp-Session-Id` header on non-`initialize` requests by
    /// routing them through an ephemeral, unpersisted session.
    pub fn stateless(mut self, stateless: bool) -> Self {
        self.stateless = stateless;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HttpTransportConfig {
        HttpTransportConfig {
            bind_addr: self.bind_addr,
            endpoint_path: self.endpoint_path,
            keep_alive: self.keep_alive,
            stateless: self.stateless,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = HttpTransportConfigBuilder::new()
            .with_bind_address("0.0.0.0:9000")
            .with_endpoint_path("/api/mcp")
            .with_keep_alive(Duration::from_secs(5))
            .stateless(true)
            .build();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.endpoint_path, "/api/mcp");
        assert_eq!(config.keep_alive, Duration::from_secs(5));
        assert!(config.stateless);
    }

    #[test]
    fn defaults_are_stateful_and_local() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.endpoint_path, "/mcp");
        assert!(!config.stateless);
    }
}
