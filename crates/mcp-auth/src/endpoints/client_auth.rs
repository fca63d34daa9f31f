//! Shared client-authentication logic for `/token` and `/revoke` (§4.9):
//! "Client authentication is Basic... OR form fields... OR (public client)
//! just `client_id`."

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::signing::now_unix;
use crate::store::ClientStore;
use crate::types::OAuthClient;

/// Decode `Authorization: Basic base64(client_id:client_secret)`, if present.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}

/// Authenticate the calling client against `form` and `headers`, per §4.9's
/// three accepted forms, and reject an expired confidential-client secret.
pub async fn authenticate_client(
    headers: &HeaderMap,
    form: &HashMap<String, String>,
    clients: &Arc<dyn ClientStore>,
) -> Result<OAuthClient> {
    let (client_id, secret) = if let Some((id, secret)) = basic_credentials(headers) {
        (id, Some(secret))
    } else if let Some(id) = form.get("client_id") {
        (id.clone(), form.get("client_secret").cloned())
    } else {
        return Err(Error::InvalidClient("no client credentials presented".to_string()));
    };

    let client = clients
        .get(&client_id)
        .await?
        .ok_or_else(|| Error::InvalidClient("unknown client".to_string()))?;

    if client.secret_expired(now_unix()) {
        return Err(Error::InvalidClient("expired".to_string()));
    }

    if client.is_public() {
        return Ok(client);
    }

    match (&client.client_secret, secret) {
        (Some(expected), Some(presented)) if expected.as_bytes().ct_eq(presented.as_bytes()).into() => Ok(client),
        _ => Err(Error::InvalidClient("client secret mismatch".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryClientStore;
    use crate::types::TokenEndpointAuthMethod;

    fn confidential_client() -> OAuthClient {
        OAuthClient {
            client_id: "client-1".to_string(),
            client_secret: Some("s3cret".to_string()),
            secret_expires_at: 0,
            redirect_uris: vec!["https://app/cb".to_string()],
            grant_types: vec!["authorization_code".to_string()],
            response_types: vec!["code".to_string()],
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretBasic,
            scope: "mcp.read".to_string(),
        }
    }

    async fn store_with(client: OAuthClient) -> Arc<dyn ClientStore> {
        let store = InMemoryClientStore::new();
        store.insert(client).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn authenticates_via_basic_header() {
        let store = store_with(confidential_client()).await;
        let mut headers = HeaderMap::new();
        let encoded = BASE64_STANDARD.encode("client-1:s3cret");
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Basic {encoded}").parse().unwrap(),
        );
        let client = authenticate_client(&headers, &HashMap::new(), &store).await.unwrap();
        assert_eq!(client.client_id, "client-1");
    }

    #[tokio::test]
    async fn authenticates_via_form_fields() {
        let store = store_with(confidential_client()).await;
        let mut form = HashMap::new();
        form.insert("client_id".to_string(), "client-1".to_string());
        form.insert("client_secret".to_string(), "s3cret".to_string());
        let client = authenticate_client(&HeaderMap::new(), &form, &store).await.unwrap();
        assert_eq!(client.client_id, "client-1");
    }

    #[tokio::test]
    async fn public_client_needs_only_client_id() {
        let mut client = confidential_client();
        client.client_secret = None;
        client.token_endpoint_auth_method = TokenEndpointAuthMethod::None;
        let store = store_with(client).await;

        let mut form = HashMap::new();
        form.insert("client_id".to_string(), "client-1".to_string());
        let client = authenticate_client(&HeaderMap::new(), &form, &store).await.unwrap();
        assert_eq!(client.client_id, "client-1");
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let store = store_with(confidential_client()).await;
        let mut form = HashMap::new();
        form.insert("client_id".to_string(), "client-1".to_string());
        form.insert("client_secret".to_string(), "wrong".to_string());
        let result = authenticate_client(&HeaderMap::new(), &form, &store).await;
        assert!(matches!(result, Err(Error::InvalidClient(_))));
    }

    #[tokio::test]
    async fn expired_secret_is_rejected_with_expired_description() {
        let mut client = confidential_client();
        client.secret_expires_at = now_unix() - 10;
        let store = store_with(client).await;

        let mut form = HashMap::new();
        form.insert("client_id".to_string(), "client-1".to_string());
        form.insert("client_secret".to_string(), "s3cret".to_string());
        let result = authenticate_client(&HeaderMap::new(), &form, &store).await;
        match result {
            Err(Error::InvalidClient(description)) => assert_eq!(description, "expired"),
            _ => panic!("expected InvalidClient(\"expired\")"),
        }
    }
}
