//! `POST /token` (§4.9), x-www-form-urlencoded.
//!
//! Token claim shape grounded on `airsstack-airsstack`'s mock OAuth2 server
//! `tokens::generate_jwt_token` (`sub`/`aud`/`iss`/`exp`/`iat`/`scope`/`client_id`).

use std::collections::HashMap;

use axum::Form;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::client_auth::authenticate_client;
use crate::error::Error;
use crate::pkce;
use crate::signing::now_unix;
use crate::state::AuthServerState;
use crate::store::RefreshTokenRecord;
use crate::types::TokenBundle;

#[derive(Debug, Serialize)]
struct TokenClaims {
    sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    aud: Option<String>,
    iss: String,
    exp: u64,
    iat: u64,
    scope: String,
    client_id: String,
}

fn random_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub async fn token(
    State(state): State<AuthServerState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let client = match authenticate_client(&headers, &form, &state.clients).await {
        Ok(client) => client,
        Err(error) => return no_store(error.into_response()),
    };

    let Some(grant_type) = form.get("grant_type") else {
        return no_store(Error::InvalidRequest("missing grant_type".to_string()).into_response());
    };

    let result = match grant_type.as_str() {
        "authorization_code" => authorization_code_grant(&state, &client.client_id, &form).await,
        "refresh_token" => refresh_token_grant(&state, &client.client_id, &form).await,
        other => Err(Error::UnsupportedGrantType(other.to_string())),
    };

    match result {
        Ok(bundle) => no_store(axum::Json(bundle).into_response()),
        Err(error) => no_store(error.into_response()),
    }
}

async fn authorization_code_grant(
    state: &AuthServerState,
    client_id: &str,
    form: &HashMap<String, String>,
) -> crate::error::Result<TokenBundle> {
    let code = form
        .get("code")
        .ok_or_else(|| Error::InvalidRequest("missing code".to_string()))?;
    let verifier = form
        .get("code_verifier")
        .ok_or_else(|| Error::InvalidRequest("missing code_verifier".to_string()))?;

    let record = state
        .codes
        .consume(code)
        .await?
        .ok_or_else(|| Error::InvalidGrant("unknown or expired code".to_string()))?;

    if record.client_id != client_id {
        return Err(Error::InvalidGrant("code was not issued to this client".to_string()));
    }
    if let Some(redirect_uri) = form.get("redirect_uri") {
        if *redirect_uri != record.redirect_uri {
            return Err(Error::InvalidGrant(
                "redirect_uri does not match the authorization request".to_string(),
            ));
        }
    }
    if !pkce::verify(verifier, &record.pkce_challenge) {
        return Err(Error::InvalidGrant("code_verifier does not match the challenge".to_string()));
    }

    let resource = form.get("resource").cloned().or(record.resource);
    mint_bundle(state, client_id, &record.scopes, resource, true).await
}

async fn refresh_token_grant(
    state: &AuthServerState,
    client_id: &str,
    form: &HashMap<String, String>,
) -> crate::error::Result<TokenBundle> {
    let refresh_token = form
        .get("refresh_token")
        .ok_or_else(|| Error::InvalidRequest("missing refresh_token".to_string()))?;

    let record = state
        .refresh_tokens
        .get(refresh_token)
        .await?
        .ok_or_else(|| Error::InvalidGrant("unknown refresh token".to_string()))?;

    if record.client_id != client_id {
        return Err(Error::InvalidGrant("refresh token was not issued to this client".to_string()));
    }

    let scopes = match form.get("scope") {
        Some(requested) => {
            let requested: Vec<String> = requested.split_whitespace().map(str::to_string).collect();
            if requested.iter().any(|s| !record.scopes.contains(s)) {
                return Err(Error::InvalidScope("requested scope exceeds the original grant".to_string()));
            }
            requested
        }
        None => record.scopes.clone(),
    };

    let resource = form.get("resource").cloned().or(record.resource);
    let mut bundle = mint_bundle(state, client_id, &scopes, resource, false).await?;
    // §4.9: "if no new refresh_token returned, the client keeps the old one."
    bundle.refresh_token = Some(refresh_token.clone());
    Ok(bundle)
}

async fn mint_bundle(
    state: &AuthServerState,
    client_id: &str,
    scopes: &[String],
    resource: Option<String>,
    issue_refresh_token: bool,
) -> crate::error::Result<TokenBundle> {
    let now = now_unix();
    let expires_in = state.config.access_token_ttl.as_secs();
    let scope = scopes.join(" ");

    let claims = TokenClaims {
        sub: client_id.to_string(),
        aud: resource.clone(),
        iss: state.signer.issuer().to_string(),
        exp: now + expires_in,
        iat: now,
        scope: scope.clone(),
        client_id: client_id.to_string(),
    };
    let access_token = state.signer.sign(&claims)?;

    let mut bundle = TokenBundle::bearer(access_token, expires_in);
    if !scope.is_empty() {
        bundle.scope = Some(scope);
    }

    if issue_refresh_token {
        let refresh_token = random_refresh_token();
        state
            .refresh_tokens
            .insert(
                refresh_token.clone(),
                RefreshTokenRecord {
                    client_id: client_id.to_string(),
                    subject: None,
                    scopes: scopes.to_vec(),
                    resource,
                },
            )
            .await?;
        bundle.refresh_token = Some(refresh_token);
    }

    Ok(bundle)
}
