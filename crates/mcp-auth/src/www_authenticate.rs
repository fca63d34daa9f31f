//! `WWW-Authenticate` header composition for 401/403 responses from the
//! resource-server bearer middleware (§4.8).
//!
//! Grounded on the teacher's `turbomcp-auth::server::WwwAuthenticateBuilder`
//! (RFC 9728 §5.1), adapted to this spec's exact field order and
//! requiredness: `error`/`error_description` are always present here (the
//! teacher treats them as optional), and `scope` is only ever attached for
//! `insufficient_scope`, per §4.8: "include `scope=\"a b c\"` only for
//! `insufficient_scope`".
pub struct WwwAuthenticateBuilder {
    error: String,
    error_description: String,
    resource_metadata: Option<String>,
    scope: Option<String>,
}

impl WwwAuthenticateBuilder {
    /// Start building a challenge for `error`/`error_description`.
    pub fn new(error: impl Into<String>, error_description: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_description: error_description.into(),
            resource_metadata: None,
            scope: None,
        }
    }

    /// Advertise the protected-resource metadata URL.
    pub fn with_resource_metadata(mut self, url: impl Into<String>) -> Self {
        self.resource_metadata = Some(url.into());
        self
    }

    /// Attach the space-delimited scopes the caller was missing. Only
    /// meaningful (per §4.8) for an `insufficient_scope` challenge.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Render the `WWW-Authenticate` header value.
    pub fn build(self) -> String {
        let mut parts = vec![
            format!("error=\"{}\"", self.error),
            format!("error_description=\"{}\"", self.error_description),
        ];
        if let Some(url) = self.resource_metadata {
            parts.push(format!("resource_metadata=\"{url}\""));
        }
        if let Some(scope) = self.scope {
            parts.push(format!("scope=\"{scope}\""));
        }
        format!("Bearer {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_challenge_has_error_and_description() {
        let header = WwwAuthenticateBuilder::new("invalid_token", "token expired").build();
        assert_eq!(header, "Bearer error=\"invalid_token\", error_description=\"token expired\"");
    }

    #[test]
    fn full_challenge_includes_resource_metadata_and_scope() {
        let header = WwwAuthenticateBuilder::new("insufficient_scope", "missing scope")
            .with_resource_metadata("https://api.example.com/.well-known/oauth-protected-resource")
            .with_scope("mcp.read mcp.write")
            .build();
        assert!(header.contains("resource_metadata=\"https://api.example.com/.well-known/oauth-protected-resource\""));
        assert!(header.contains("scope=\"mcp.read mcp.write\""));
    }
}
