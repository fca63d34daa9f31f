//! `POST /revoke` (§4.9, RFC 7009). Always 200, even for an unknown token —
//! "unknown token is also 200".

use std::collections::HashMap;

use axum::Form;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::client_auth::authenticate_client;
use crate::state::AuthServerState;

pub async fn revoke(
    State(state): State<AuthServerState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut response = match authenticate_client(&headers, &form, &state.clients).await {
        Ok(_) => {
            if let Some(token) = form.get("token") {
                let _ = state.refresh_tokens.remove(token).await;
            }
            StatusCode::OK.into_response()
        }
        Err(error) => error.into_response(),
    };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthServerConfig;
    use crate::store::RefreshTokenRecord;
    use crate::types::{OAuthClient, TokenEndpointAuthMethod};

    async fn state_with_client() -> AuthServerState {
        let state = AuthServerState::in_memory(AuthServerConfig::default());
        state
            .clients
            .insert(OAuthClient {
                client_id: "client-1".to_string(),
                client_secret: None,
                secret_expires_at: 0,
                redirect_uris: vec!["https://app/cb".to_string()],
                grant_types: vec!["refresh_token".to_string()],
                response_types: vec!["code".to_string()],
                token_endpoint_auth_method: TokenEndpointAuthMethod::None,
                scope: "mcp.read".to_string(),
            })
            .await
            .unwrap();
        state
    }

    fn form_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn revoking_a_known_token_removes_it_and_returns_200() {
        let state = state_with_client().await;
        state
            .refresh_tokens
            .insert(
                "rt-1".to_string(),
                RefreshTokenRecord {
                    client_id: "client-1".to_string(),
                    subject: None,
                    scopes: vec![],
                    resource: None,
                },
            )
            .await
            .unwrap();

        let form = form_with(&[("client_id", "client-1"), ("token", "rt-1")]);
        let response = revoke(State(state.clone()), HeaderMap::new(), Form(form)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.refresh_tokens.get("rt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoking_an_unknown_token_is_still_200() {
        let state = state_with_client().await;
        let form = form_with(&[("client_id", "client-1"), ("token", "never-issued")]);
        let response = revoke(State(state), HeaderMap::new(), Form(form)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unauthenticated_revoke_is_rejected() {
        let state = state_with_client().await;
        let form = form_with(&[("token", "rt-1")]);
        let response = revoke(State(state), HeaderMap::new(), Form(form)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
