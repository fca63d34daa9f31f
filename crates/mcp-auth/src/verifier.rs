//! The pluggable Token Verifier: local JWKS, remote JWKS, introspection, or
//! a JWKS-primary/introspection-fallback hybrid (§4.10).

use crate::error::{Error, Result};
use crate::jwt::JwtValidator;
use crate::introspection::IntrospectionClient;
use crate::types::AuthInfo;

/// One of the four Token Verifier configurations named in §4.10.
pub enum TokenVerifier {
    /// JWT verification against a fixed, locally supplied JWKS.
    LocalJwks(JwtValidator),
    /// JWT verification against a remotely fetched, cached JWKS.
    RemoteJwks(JwtValidator),
    /// RFC 7662 introspection only; no JWT parsing.
    Introspection(IntrospectionClient),
    /// JWKS primary, introspection fallback on JWT failure.
    Hybrid {
        /// The JWT validator tried first.
        jwt: JwtValidator,
        /// The introspection client used as a fallback.
        introspection: IntrospectionClient,
        /// Whether to fall back at all ("Fallback discipline", §4.10).
        use_on_jwt_fail: bool,
    },
}

impl TokenVerifier {
    /// Verify `token`, returning the [`AuthInfo`] downstream handlers see.
    ///
    /// The token string itself is never placed in the returned `AuthInfo`
    /// (§4.8 step 4: "clear the token string... before binding").
    pub async fn verify(&self, token: &str) -> Result<AuthInfo> {
        match self {
            Self::LocalJwks(validator) | Self::RemoteJwks(validator) => {
                let result = validator.validate(token).await?;
                Ok(result.claims.into_auth_info())
            }
            Self::Introspection(client) => Self::verify_via_introspection(client, token).await,
            Self::Hybrid {
                jwt,
                introspection,
                use_on_jwt_fail,
            } => match jwt.validate(token).await {
                Ok(result) => Ok(result.claims.into_auth_info()),
                Err(jwt_err) => {
                    if *use_on_jwt_fail {
                        Self::verify_via_introspection(introspection, token).await
                    } else {
                        Err(jwt_err)
                    }
                }
            },
        }
    }

    async fn verify_via_introspection(client: &IntrospectionClient, token: &str) -> Result<AuthInfo> {
        let response = client.introspect(token).await?;
        if !response.active {
            return Err(Error::InvalidToken("token is not active".to_string()));
        }

        let scopes = response
            .scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let resource = response.aud.as_ref().and_then(|aud| match aud {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(entries) => entries
                .iter()
                .find_map(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        });

        Ok(AuthInfo {
            client_id: response.client_id.clone(),
            subject: response.sub.clone(),
            scopes,
            expires_at: response.exp,
            resource,
            extra: response.additional.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtValidator;

    #[tokio::test]
    async fn local_jwks_rejects_a_garbage_token() {
        let validator = JwtValidator::local(
            "https://issuer",
            jsonwebtoken::jwk::JwkSet { keys: Vec::new() },
        );
        let verifier = TokenVerifier::LocalJwks(validator);
        let result = verifier.verify("not-a-jwt").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn introspection_rejects_inactive_token() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "active": false,
            })))
            .mount(&server)
            .await;

        let client = IntrospectionClient::new(format!("{}/introspect", server.uri()), "client", None);
        let verifier = TokenVerifier::Introspection(client);
        let result = verifier.verify("opaque-token").await;
        assert!(matches!(result, Err(Error::InvalidToken(_))));
    }

    #[tokio::test]
    async fn introspection_accepts_active_token_with_scopes() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "active": true,
                "scope": "mcp.read mcp.write",
                "sub": "user-1",
            })))
            .mount(&server)
            .await;

        let client = IntrospectionClient::new(format!("{}/introspect", server.uri()), "client", None);
        let verifier = TokenVerifier::Introspection(client);
        let info = verifier.verify("opaque-token").await.unwrap();
        assert_eq!(info.subject.as_deref(), Some("user-1"));
        assert_eq!(info.scopes, vec!["mcp.read", "mcp.write"]);
    }
}
