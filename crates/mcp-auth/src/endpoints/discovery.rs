//! `.well-known` discovery documents (§4.9).

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;

use crate::state::AuthServerState;

/// `GET /.well-known/oauth-authorization-server` (RFC 8414).
#[derive(Debug, Serialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub response_types_supported: Vec<&'static str>,
    pub grant_types_supported: Vec<&'static str>,
    pub code_challenge_methods_supported: Vec<&'static str>,
    pub token_endpoint_auth_methods_supported: Vec<&'static str>,
    pub scopes_supported: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,
}

pub async fn authorization_server_metadata(
    State(state): State<AuthServerState>,
) -> Json<AuthorizationServerMetadata> {
    let config = &state.config;
    Json(AuthorizationServerMetadata {
        issuer: config.issuer.clone(),
        authorization_endpoint: format!("{}{}", config.issuer, config.authorize_path),
        token_endpoint: format!("{}{}", config.issuer, config.token_path),
        response_types_supported: vec!["code"],
        grant_types_supported: vec!["authorization_code", "refresh_token"],
        code_challenge_methods_supported: vec!["S256"],
        token_endpoint_auth_methods_supported: vec!["client_secret_post", "client_secret_basic"],
        scopes_supported: config.scopes_supported.clone(),
        registration_endpoint: config
            .registration_enabled
            .then(|| format!("{}{}", config.issuer, config.register_path)),
        revocation_endpoint: Some(format!("{}{}", config.issuer, config.revoke_path)),
    })
}

/// `GET /.well-known/oauth-protected-resource` (RFC 9728).
#[derive(Debug, Serialize)]
pub struct ProtectedResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub scopes_supported: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_documentation: Option<String>,
}

pub async fn protected_resource_metadata(
    State(state): State<AuthServerState>,
) -> Json<ProtectedResourceMetadata> {
    let config = &state.config;
    Json(ProtectedResourceMetadata {
        resource: config.issuer.clone(),
        authorization_servers: vec![config.issuer.clone()],
        scopes_supported: config.scopes_supported.clone(),
        resource_name: None,
        resource_documentation: None,
    })
}

/// `GET /.well-known/jwks.json`, publishing the signer's public key.
pub async fn jwks(State(state): State<AuthServerState>) -> Json<Value> {
    Json(serde_json::to_value(state.signer.jwks()).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthServerConfigBuilder;

    #[tokio::test]
    async fn metadata_advertises_registration_only_when_enabled() {
        let config = AuthServerConfigBuilder::new("https://as.example.com")
            .with_registration_enabled(true)
            .build().unwrap();
        let state = AuthServerState::in_memory(config);
        let metadata = authorization_server_metadata(State(state)).await.0;
        assert!(metadata.registration_endpoint.is_some());
        assert_eq!(metadata.grant_types_supported, vec!["authorization_code", "refresh_token"]);
        assert_eq!(metadata.code_challenge_methods_supported, vec!["S256"]);
    }

    #[tokio::test]
    async fn metadata_omits_registration_when_disabled() {
        let config = AuthServerConfigBuilder::new("https://as.example.com").build().unwrap();
        let state = AuthServerState::in_memory(config);
        let metadata = authorization_server_metadata(State(state)).await.0;
        assert!(metadata.registration_endpoint.is_none());
    }

    #[tokio::test]
    async fn protected_resource_metadata_names_the_issuer_as_authorization_server() {
        let config = AuthServerConfigBuilder::new("https://as.example.com").build().unwrap();
        let state = AuthServerState::in_memory(config);
        let metadata = protected_resource_metadata(State(state)).await.0;
        assert_eq!(metadata.authorization_servers, vec!["https://as.example.com"]);
    }
}
