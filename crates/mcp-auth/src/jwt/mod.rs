//! JWT validation against local or remote JWKS.

pub mod jwks;
pub mod validator;

pub use jwks::{JwksCache, JwksClient};
pub use validator::{Audience, JwtValidationResult, JwtValidator, MultiIssuerValidator, StandardClaims};
