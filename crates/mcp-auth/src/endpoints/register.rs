//! `POST /register` (§4.9): RFC 7591 Dynamic Client Registration.

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::rate_limit::RateLimit;
use crate::signing::now_unix;
use crate::state::AuthServerState;
use crate::types::{OAuthClient, TokenEndpointAuthMethod};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub token_endpoint_auth_method: Option<String>,
    #[serde(default)]
    pub grant_types: Option<Vec<String>>,
    #[serde(default)]
    pub response_types: Option<Vec<String>>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub client_id_issued_at: u64,
    pub client_secret_expires_at: u64,
    pub redirect_uris: Vec<String>,
    pub token_endpoint_auth_method: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scope: String,
}

fn parse_auth_method(value: Option<&str>) -> Result<TokenEndpointAuthMethod, Error> {
    match value.unwrap_or("client_secret_basic") {
        "none" => Ok(TokenEndpointAuthMethod::None),
        "client_secret_basic" => Ok(TokenEndpointAuthMethod::ClientSecretBasic),
        "client_secret_post" => Ok(TokenEndpointAuthMethod::ClientSecretPost),
        other => Err(Error::InvalidClientMetadata(format!(
            "unsupported token_endpoint_auth_method: {other}"
        ))),
    }
}

fn random_client_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn register(State(state): State<AuthServerState>, body: axum::body::Bytes) -> Response {
    if !state.config.registration_enabled {
        return Error::RegistrationNotSupported.into_response();
    }

    if !state.rate_limiter.check(
        "register",
        RateLimit::new(state.config.registration_rate_limit_per_hour, Duration::from_secs(3600)),
    ) {
        return Error::RateLimited.into_response();
    }

    let request: RegisterRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return Error::InvalidClientMetadata(format!("malformed registration body: {e}")).into_response(),
    };

    if request.redirect_uris.is_empty() {
        return Error::InvalidClientMetadata("redirect_uris must not be empty".to_string()).into_response();
    }

    let auth_method = match parse_auth_method(request.token_endpoint_auth_method.as_deref()) {
        Ok(method) => method,
        Err(error) => return error.into_response(),
    };

    let is_public = auth_method == TokenEndpointAuthMethod::None;
    let (client_secret, secret_expires_at) = if is_public {
        (None, 0)
    } else {
        let expires_at = now_unix() + state.config.default_secret_ttl.as_secs();
        (Some(random_client_secret()), expires_at)
    };

    let client_id = Uuid::new_v4().to_string();
    let grant_types = request
        .grant_types
        .unwrap_or_else(|| vec!["authorization_code".to_string(), "refresh_token".to_string()]);
    let response_types = request.response_types.unwrap_or_else(|| vec!["code".to_string()]);
    let scope = request.scope.unwrap_or_default();

    let client = OAuthClient {
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
        secret_expires_at,
        redirect_uris: request.redirect_uris.clone(),
        grant_types: grant_types.clone(),
        response_types: response_types.clone(),
        token_endpoint_auth_method: auth_method,
        scope: scope.clone(),
    };

    if let Err(_e) = state.clients.insert(client).await {
        return Error::Internal("failed to persist registered client".to_string()).into_response();
    }

    let response = RegisterResponse {
        client_id,
        client_secret,
        client_id_issued_at: now_unix(),
        client_secret_expires_at: secret_expires_at,
        redirect_uris: request.redirect_uris,
        token_endpoint_auth_method: request
            .token_endpoint_auth_method
            .unwrap_or_else(|| "client_secret_basic".to_string()),
        grant_types,
        response_types,
        scope,
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthServerConfigBuilder;

    fn body_for(redirect_uris: &[&str], auth_method: Option<&str>) -> axum::body::Bytes {
        let json = serde_json::json!({
            "redirect_uris": redirect_uris,
            "token_endpoint_auth_method": auth_method,
        });
        axum::body::Bytes::from(serde_json::to_vec(&json).unwrap())
    }

    #[tokio::test]
    async fn returns_501_when_registration_disabled() {
        let state = AuthServerState::in_memory(AuthServerConfigBuilder::new("https://as.example.com").build().unwrap());
        let response = register(State(state), body_for(&["https://app/cb"], None)).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn public_client_gets_no_secret() {
        let config = AuthServerConfigBuilder::new("https://as.example.com")
            .with_registration_enabled(true)
            .build().unwrap();
        let state = AuthServerState::in_memory(config);
        let response = register(State(state), body_for(&["https://app/cb"], Some("none"))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn empty_redirect_uris_is_rejected() {
        let config = AuthServerConfigBuilder::new("https://as.example.com")
            .with_registration_enabled(true)
            .build().unwrap();
        let state = AuthServerState::in_memory(config);
        let response = register(State(state), body_for(&[], None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsupported_auth_method_is_rejected() {
        let config = AuthServerConfigBuilder::new("https://as.example.com")
            .with_registration_enabled(true)
            .build().unwrap();
        let state = AuthServerState::in_memory(config);
        let response = register(State(state), body_for(&["https://app/cb"], Some("private_key_jwt"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
