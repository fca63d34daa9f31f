//! Authorization-server HTTP handlers (§4.9), grounded on the teacher's
//! `turbomcp-auth::server` handler shapes and, for the concrete JSON/form
//! wire format, on `airsstack-airsstack`'s mock OAuth2 server `endpoints.rs`.

pub mod authorize;
pub mod client_auth;
pub mod discovery;
pub mod register;
pub mod revoke;
pub mod token;
