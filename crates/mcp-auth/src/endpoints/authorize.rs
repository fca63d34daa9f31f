//! `GET /authorize` (§4.9).
//!
//! Request/response shape grounded on `airsstack-airsstack`'s mock OAuth2
//! server `authorization_endpoint` handler, adapted to this spec's redirect
//! discipline: failures before the redirect URI is validated render an
//! OAuth error JSON body; failures after it redirect with `error`/`state`.

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Error;
use crate::pkce;
use crate::signing::now_unix;
use crate::state::AuthServerState;
use crate::types::AuthorizationCodeRecord;

const QUERY_ESCAPE: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'&').add(b'=');

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub resource: Option<String>,
}

fn escape(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ESCAPE).to_string()
}

fn redirect_with_code(redirect_uri: &str, code: &str, state: Option<&str>) -> Response {
    let mut location = format!("{redirect_uri}?code={}", escape(code));
    if let Some(state) = state {
        location.push_str(&format!("&state={}", escape(state)));
    }
    redirect_to(&location)
}

fn redirect_with_error(redirect_uri: &str, error: &str, state: Option<&str>) -> Response {
    let mut location = format!("{redirect_uri}?error={}", escape(error));
    if let Some(state) = state {
        location.push_str(&format!("&state={}", escape(state)));
    }
    redirect_to(&location)
}

fn redirect_to(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = location.parse() {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

pub async fn authorize(
    State(state): State<AuthServerState>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let Some(client_id) = query.client_id else {
        return Error::InvalidRequest("missing client_id".to_string()).into_response();
    };
    let client = match state.clients.get(&client_id).await {
        Ok(Some(client)) => client,
        Ok(None) => return Error::InvalidClient("unknown client".to_string()).into_response(),
        Err(_) => return Error::Internal("client lookup failed".to_string()).into_response(),
    };

    let Some(redirect_uri) = query.redirect_uri else {
        return Error::InvalidRequest("missing redirect_uri".to_string()).into_response();
    };
    if !client.allows_redirect_uri(&redirect_uri) {
        return Error::InvalidRequest("redirect_uri not registered for this client".to_string())
            .into_response();
    }

    // Past this point, the redirect target is trusted: any further failure
    // reports back through it rather than as a bare JSON body.
    if query.response_type.as_deref() != Some("code") {
        return redirect_with_error(&redirect_uri, "unsupported_response_type", query.state.as_deref());
    }

    let Some(code_challenge) = query.code_challenge else {
        return redirect_with_error(&redirect_uri, "invalid_request", query.state.as_deref());
    };
    if !pkce::is_valid_challenge(&code_challenge) {
        return redirect_with_error(&redirect_uri, "invalid_request", query.state.as_deref());
    }
    if query.code_challenge_method.as_deref() != Some("S256") {
        return redirect_with_error(&redirect_uri, "invalid_request", query.state.as_deref());
    }

    let scopes = query
        .scope
        .as_deref()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let code = Uuid::new_v4().to_string();
    let record = AuthorizationCodeRecord {
        code: code.clone(),
        client_id: client.client_id.clone(),
        pkce_challenge: code_challenge,
        redirect_uri: redirect_uri.clone(),
        scopes,
        resource: query.resource,
        expires_at: now_unix() + state.config.code_ttl.as_secs(),
    };
    if state.codes.insert(record).await.is_err() {
        return redirect_with_error(&redirect_uri, "server_error", query.state.as_deref());
    }

    redirect_with_code(&redirect_uri, &code, query.state.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthServerConfig;
    use crate::types::{OAuthClient, TokenEndpointAuthMethod};

    async fn state_with_client() -> AuthServerState {
        let state = AuthServerState::in_memory(AuthServerConfig::default());
        state
            .clients
            .insert(OAuthClient {
                client_id: "client-1".to_string(),
                client_secret: None,
                secret_expires_at: 0,
                redirect_uris: vec!["https://app.example.com/cb".to_string()],
                grant_types: vec!["authorization_code".to_string()],
                response_types: vec!["code".to_string()],
                token_endpoint_auth_method: TokenEndpointAuthMethod::None,
                scope: "mcp.read".to_string(),
            })
            .await
            .unwrap();
        state
    }

    fn valid_challenge() -> String {
        pkce::challenge_for_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
    }

    #[tokio::test]
    async fn unknown_client_renders_json_error_not_a_redirect() {
        let state = state_with_client().await;
        let query = AuthorizeQuery {
            response_type: Some("code".to_string()),
            client_id: Some("nope".to_string()),
            redirect_uri: Some("https://app.example.com/cb".to_string()),
            code_challenge: Some(valid_challenge()),
            code_challenge_method: Some("S256".to_string()),
            scope: None,
            state: None,
            resource: None,
        };
        let response = authorize(State(state), Query(query)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_challenge_redirects_with_error_and_state() {
        let state = state_with_client().await;
        let query = AuthorizeQuery {
            response_type: Some("code".to_string()),
            client_id: Some("client-1".to_string()),
            redirect_uri: Some("https://app.example.com/cb".to_string()),
            code_challenge: Some("too-short".to_string()),
            code_challenge_method: Some("S256".to_string()),
            scope: None,
            state: Some("xyz".to_string()),
            resource: None,
        };
        let response = authorize(State(state), Query(query)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("https://app.example.com/cb?error=invalid_request"));
        assert!(location.contains("state=xyz"));
    }

    #[tokio::test]
    async fn success_redirects_with_code_and_echoes_state() {
        let state = state_with_client().await;
        let query = AuthorizeQuery {
            response_type: Some("code".to_string()),
            client_id: Some("client-1".to_string()),
            redirect_uri: Some("https://app.example.com/cb".to_string()),
            code_challenge: Some(valid_challenge()),
            code_challenge_method: Some("S256".to_string()),
            scope: Some("mcp.read".to_string()),
            state: Some("xyz".to_string()),
            resource: None,
        };
        let response = authorize(State(state), Query(query)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("https://app.example.com/cb?code="));
        assert!(location.contains("state=xyz"));
    }
}
