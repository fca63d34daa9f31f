//! Resource-server bearer-token middleware (§4.8: "OAuth Resource-Server
//! Middleware").
//!
//! Grounded on the teacher's `turbomcp-auth::tower::service::AuthService`
//! (token extraction, bypass paths, anonymous-access fallback), but written
//! as an `axum::middleware::from_fn_with_state` function rather than a
//! generic `tower::Service` impl — `mcp-transport-http` already builds all
//! of its cross-cutting concerns this way, and nothing else in this
//! workspace needs the teacher's non-HTTP `AuthenticatedRequest<B>`
//! generality.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::ResourceServerConfig;
use crate::error::Error;
use crate::resource::audience_allowed;
use crate::verifier::TokenVerifier;
use crate::www_authenticate::WwwAuthenticateBuilder;

/// Shared state for [`require_bearer_token`].
#[derive(Clone)]
pub struct ResourceServerState {
    /// Required scopes, expected issuer/audience, and the metadata URL
    /// advertised in `WWW-Authenticate` challenges.
    pub config: ResourceServerConfig,
    /// The verifier consulted to validate a presented token.
    pub verifier: Arc<TokenVerifier>,
}

/// Extract `Authorization: Bearer <token>`, per step 1 of §4.8.
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn challenge(state: &ResourceServerState, error: &str, description: &str, scope: Option<&str>) -> String {
    let mut builder = WwwAuthenticateBuilder::new(error, description);
    if let Some(url) = &state.config.resource_metadata_url {
        builder = builder.with_resource_metadata(url.clone());
    }
    if let Some(scope) = scope {
        builder = builder.with_scope(scope);
    }
    builder.build()
}

fn unauthorized(state: &ResourceServerState, error: &str, description: &str) -> Response {
    let header_value = challenge(state, error, description, None);
    let mut response = Error::InvalidToken(description.to_string()).into_response();
    insert_www_authenticate(&mut response, &header_value);
    response
}

fn forbidden(state: &ResourceServerState, missing_scope: &str) -> Response {
    let description = format!("missing required scope: {missing_scope}");
    let header_value = challenge(state, "insufficient_scope", &description, Some(missing_scope));
    let mut response = Error::InsufficientScope(missing_scope.to_string()).into_response();
    insert_www_authenticate(&mut response, &header_value);
    response
}

fn insert_www_authenticate(response: &mut Response, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
}

/// Map a [`TokenVerifier::verify`] failure onto the three outcomes §4.8 step
/// 2 distinguishes: invalid-token (401), insufficient-scope (403), and an
/// internal verifier failure such as a JWKS/introspection fetch (500).
/// `Error::status()` already knows these mappings; this only adds the
/// `WWW-Authenticate` challenge the 401/403 cases carry.
fn verification_failure(state: &ResourceServerState, error: Error) -> Response {
    match error {
        Error::InsufficientScope(scope) => forbidden(state, &scope),
        Error::InvalidToken(description) => unauthorized(state, "invalid_token", &description),
        other => other.into_response(),
    }
}

/// Verify the bearer token on an incoming request (§4.8 steps 1-4):
///
/// 1. Extract `Authorization: Bearer <token>`; missing/malformed is a 401.
/// 2. Verify the token via the configured [`TokenVerifier`].
/// 3. Enforce expiry, issuer, audience, and required scopes.
/// 4. Clear the token string and bind [`AuthInfo`](crate::types::AuthInfo)
///    into request extensions for downstream handlers.
pub async fn require_bearer_token(
    State(state): State<ResourceServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&request) else {
        return unauthorized(&state, "invalid_token", "missing bearer token");
    };

    let auth_info = match state.verifier.verify(token).await {
        Ok(info) => info,
        Err(error) => return verification_failure(&state, error),
    };

    if let Some(expires_at) = auth_info.expires_at {
        let now = crate::signing::now_unix();
        if expires_at < now {
            return unauthorized(&state, "invalid_token", "token has expired");
        }
    }

    // Issuer is already enforced for JWTs inside `JwtValidator::validate`
    // (`Validation::set_issuer`); `state.config.expected_issuer` exists so
    // callers can construct a matching [`crate::jwt::JwtValidator`], not as
    // a second check here.

    if !audience_allowed(auth_info.resource.as_deref(), &state.config.expected_audience) {
        return unauthorized(&state, "invalid_token", "token not valid for this resource");
    }

    for scope in &state.config.required_scopes {
        if !auth_info.has_scopes(&[scope.as_str()]) {
            return forbidden(&state, scope);
        }
    }

    // §4.8 step 4: the raw token string never enters `AuthInfo` or request
    // extensions — only the verified claims below do.
    request.extensions_mut().insert(auth_info);

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[test]
    fn extracts_bearer_token_from_header() {
        let request = HttpRequest::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&request), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let request = HttpRequest::builder()
            .header(header::AUTHORIZATION, "Basic abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&request), None);
    }

    #[test]
    fn rejects_missing_header() {
        let request = HttpRequest::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_bearer_token(&request), None);
    }

    fn state() -> ResourceServerState {
        ResourceServerState {
            config: ResourceServerConfig::new(),
            verifier: Arc::new(TokenVerifier::LocalJwks(crate::jwt::JwtValidator::local(
                "https://issuer",
                jsonwebtoken::jwk::JwkSet { keys: Vec::new() },
            ))),
        }
    }

    #[test]
    fn invalid_token_failure_is_401_with_challenge() {
        let response = verification_failure(&state(), Error::InvalidToken("expired".to_string()));
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn insufficient_scope_failure_is_403_with_challenge() {
        let response = verification_failure(&state(), Error::InsufficientScope("mcp.write".to_string()));
        assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn internal_verifier_failure_is_500() {
        let response = verification_failure(&state(), Error::Internal("jwks cache poisoned".to_string()));
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
