//! Wires the authorization-server endpoints into one `axum::Router`
//! (§4.9: "All endpoints are wrapped by (outermost first): CORS →
//! method-allow-list → rate-limit → endpoint-specific handler").
//!
//! Method-allow-list is structural here: each path is registered with only
//! the methods §4.9 names, and axum's `MethodRouter` answers every other
//! method with 405 plus an `Allow` header on its own. Per-endpoint
//! rate-limiting lives inside [`crate::endpoints::register::register`]
//! (the only endpoint this spec names a concrete limit for).

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::audit::AuditConfig;
use crate::endpoints::{authorize, discovery, register, revoke, token};
use crate::state::AuthServerState;

/// Build the authorization-server router, wrapped in the audit middleware
/// (innermost) and CORS (outermost).
pub fn auth_server_router(state: AuthServerState, audit_config: AuditConfig) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/.well-known/oauth-authorization-server", get(discovery::authorization_server_metadata))
        .route("/.well-known/oauth-protected-resource", get(discovery::protected_resource_metadata))
        .route("/.well-known/jwks.json", get(discovery::jwks))
        .route(&config.authorize_path, get(authorize::authorize))
        .route(&config.token_path, post(token::token))
        .route(&config.revoke_path, post(revoke::revoke));

    if config.registration_enabled {
        router = router.route(&config.register_path, post(register::register));
    }

    router
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(audit_config, crate::audit::audit_layer))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthServerConfigBuilder;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn discovery_endpoint_is_served() {
        let state = AuthServerState::in_memory(AuthServerConfigBuilder::new("https://as.example.com").build().unwrap());
        let app = auth_server_router(state, AuditConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/.well-known/oauth-authorization-server")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_route_is_absent_when_registration_disabled() {
        let state = AuthServerState::in_memory(AuthServerConfigBuilder::new("https://as.example.com").build().unwrap());
        let app = auth_server_router(state, AuditConfig::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_on_token_is_405() {
        let state = AuthServerState::in_memory(AuthServerConfigBuilder::new("https://as.example.com").build().unwrap());
        let app = auth_server_router(state, AuditConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/token").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
