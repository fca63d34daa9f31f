//! OAuth 2.1 authorization-server endpoints, resource-server bearer
//! middleware, and the pluggable token verifier gating access to MCP
//! sessions.
//!
//! Grounded on the teacher crate `turbomcp-auth`'s JWT validation, JWKS
//! caching, introspection, and PKCE building blocks, extended with the
//! token-issuance half (`signing`, `endpoints`, `router`) this spec's
//! authorization server needs and the teacher never implemented.

pub mod audit;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod introspection;
pub mod jwt;
pub mod middleware;
pub mod pkce;
pub mod rate_limit;
pub mod resource;
pub mod router;
pub mod signing;
pub mod state;
pub mod store;
pub mod types;
pub mod verifier;
pub mod www_authenticate;

pub use config::{AuthServerConfig, AuthServerConfigBuilder, ResourceServerConfig};
pub use error::{Error, Result};
pub use router::auth_server_router;
pub use signing::TokenSigner;
pub use state::AuthServerState;
pub use types::{AuthInfo, OAuthClient, TokenBundle};
pub use verifier::TokenVerifier;
