//! JWT validation against a local or remote JWKS.
//!
//! Grounded on the teacher's `turbomcp-auth::jwt::validator::JwtValidator`.
//! One deliberate divergence: `clock_skew_leeway` defaults to **30 seconds**
//! here, not the teacher's 60, to match this spec's §4.10 ("clock skew
//! tolerance 30 s") exactly — recorded as an explicit Open Question
//! resolution in `DESIGN.md` rather than silently inherited.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{AuthInfo, STANDARD_CLAIM_KEYS};

use super::jwks::{JwksCache, JwksClient};

/// Registered JWT claims (RFC 7519) plus the scope-carrying claims this
/// spec reads (`scope`, `scp`). Unrecognized claims are captured via
/// `#[serde(flatten)]` and end up in [`AuthInfo::extra`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StandardClaims {
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience: either a single value or a list (both forms appear in the wild).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiration (Unix seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Issued-at (Unix seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// JWT id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Space-delimited scope string (OAuth2 convention).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Scope as an array (some issuers emit this instead of `scope`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scp: Option<Vec<String>>,
    /// All other claims.
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

/// Either a single audience string or a list, as issued in the wild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience value.
    One(String),
    /// Multiple audience values.
    Many(Vec<String>),
}

impl Audience {
    /// All entries as a flat slice of owned strings.
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::One(a) => vec![a.clone()],
            Self::Many(many) => many.clone(),
        }
    }
}

impl StandardClaims {
    /// Map these claims onto the [`AuthInfo`] propagated to downstream handlers.
    ///
    /// Scopes come from `scope` (space-split) if present, else `scp`.
    /// Resource is the first `aud` entry that parses as an absolute URL with
    /// a scheme and host. `extra` is every claim outside
    /// [`STANDARD_CLAIM_KEYS`].
    pub fn into_auth_info(self) -> AuthInfo {
        let scopes = if let Some(scope) = &self.scope {
            scope.split_whitespace().map(str::to_string).collect()
        } else if let Some(scp) = &self.scp {
            scp.clone()
        } else {
            Vec::new()
        };

        let resource = self.aud.as_ref().and_then(|aud| {
            aud.entries().into_iter().find(|candidate| {
                url::Url::parse(candidate)
                    .map(|u| u.host_str().is_some())
                    .unwrap_or(false)
            })
        });

        let client_id = self
            .additional
            .get("client_id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let mut extra = self.additional;
        for key in STANDARD_CLAIM_KEYS {
            extra.remove(*key);
        }

        AuthInfo {
            client_id,
            subject: self.sub,
            scopes,
            expires_at: self.exp,
            resource,
            extra,
        }
    }
}

/// Outcome of validating a JWT: the claims plus metadata about how it was signed.
#[derive(Debug, Clone)]
pub struct JwtValidationResult {
    /// The validated claims.
    pub claims: StandardClaims,
    /// Signing algorithm used.
    pub algorithm: Algorithm,
    /// Key id from the JWT header.
    pub key_id: Option<String>,
}

const DEFAULT_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::RS256, Algorithm::PS256];
/// Clock skew tolerance per this spec's §4.10 ("clock skew tolerance 30 s").
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(30);

/// Validates JWTs issued by a single issuer against that issuer's JWKS.
pub struct JwtValidator {
    expected_issuer: String,
    expected_audience: Option<String>,
    jwks_client: Arc<JwksClient>,
    clock_skew_leeway: Duration,
    allowed_algorithms: Vec<Algorithm>,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("expected_issuer", &self.expected_issuer)
            .field("expected_audience", &self.expected_audience)
            .field("clock_skew_leeway", &self.clock_skew_leeway)
            .field("allowed_algorithms", &self.allowed_algorithms)
            .finish()
    }
}

impl JwtValidator {
    /// Build a validator for `expected_issuer`'s tokens, fetching keys from `jwks_uri`.
    ///
    /// `expected_audience` is optional: §4.8 treats audience enforcement as
    /// configured separately from issuer-level JWT validation, so a
    /// validator may be built without one and audience checked later via
    /// [`crate::resource::audience_allowed`].
    pub fn new(expected_issuer: impl Into<String>, jwks_uri: impl Into<String>) -> Self {
        Self {
            expected_issuer: expected_issuer.into(),
            expected_audience: None,
            jwks_client: Arc::new(JwksClient::new(jwks_uri)),
            clock_skew_leeway: DEFAULT_CLOCK_SKEW,
            allowed_algorithms: DEFAULT_ALGORITHMS.to_vec(),
        }
    }

    /// Build a validator backed by a fixed, locally supplied key set — the
    /// "Local JWKS" Token Verifier configuration, no network access at all.
    pub fn local(expected_issuer: impl Into<String>, jwks: jsonwebtoken::jwk::JwkSet) -> Self {
        Self {
            expected_issuer: expected_issuer.into(),
            expected_audience: None,
            jwks_client: Arc::new(JwksClient::from_static(jwks)),
            clock_skew_leeway: DEFAULT_CLOCK_SKEW,
            allowed_algorithms: DEFAULT_ALGORITHMS.to_vec(),
        }
    }

    /// Use a shared [`JwksClient`] (e.g. one owned by a [`MultiIssuerValidator`]).
    pub fn with_jwks_client(
        expected_issuer: impl Into<String>,
        jwks_client: Arc<JwksClient>,
    ) -> Self {
        Self {
            expected_issuer: expected_issuer.into(),
            expected_audience: None,
            jwks_client,
            clock_skew_leeway: DEFAULT_CLOCK_SKEW,
            allowed_algorithms: DEFAULT_ALGORITHMS.to_vec(),
        }
    }

    /// Require a specific `aud` claim value at the `jsonwebtoken` validation layer.
    pub fn with_expected_audience(mut self, audience: impl Into<String>) -> Self {
        self.expected_audience = Some(audience.into());
        self
    }

    /// Override the clock skew tolerance (default [`DEFAULT_CLOCK_SKEW`]).
    pub fn with_clock_skew(mut self, leeway: Duration) -> Self {
        self.clock_skew_leeway = leeway;
        self
    }

    /// Override the allowed signing algorithms (default ES256/RS256/PS256;
    /// never include `none` or an HMAC algorithm here).
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }

    /// Validate `token`'s signature and standard claims, refreshing the JWKS
    /// once and retrying if the key id is not found in the cached set.
    pub async fn validate(&self, token: &str) -> Result<JwtValidationResult> {
        match self.validate_once(token).await {
            Ok(result) => Ok(result),
            Err(Error::InvalidToken(_)) => {
                self.jwks_client.refresh().await?;
                self.validate_once(token).await
            }
            Err(other) => Err(other),
        }
    }

    async fn validate_once(&self, token: &str) -> Result<JwtValidationResult> {
        let header = decode_header(token)
            .map_err(|e| Error::InvalidToken(format!("invalid JWT format: {e}")))?;

        if !self.allowed_algorithms.contains(&header.alg) {
            return Err(Error::InvalidToken(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let key_id = header
            .kid
            .clone()
            .ok_or_else(|| Error::InvalidToken("JWT missing kid in header".to_string()))?;

        let jwks = self.jwks_client.get_jwks().await?;
        let jwk = jwks
            .find(&key_id)
            .ok_or_else(|| Error::InvalidToken(format!("key id '{key_id}' not found in JWKS")))?;
        let decoding_key = DecodingKey::from_jwk(jwk)
            .map_err(|e| Error::Internal(format!("invalid JWK: {e}")))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.expected_issuer]);
        if let Some(audience) = &self.expected_audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }
        validation.leeway = self.clock_skew_leeway.as_secs();

        let token_data = decode::<StandardClaims>(token, &decoding_key, &validation)
            .map_err(|e| Error::InvalidToken(format!("JWT validation failed: {e}")))?;

        Ok(JwtValidationResult {
            claims: token_data.claims,
            algorithm: header.alg,
            key_id: Some(key_id),
        })
    }
}

/// Validates tokens from any of several configured issuers, dispatching to
/// the matching per-issuer [`JwtValidator`] by the token's unverified `iss` claim.
#[derive(Debug, Default)]
pub struct MultiIssuerValidator {
    validators: HashMap<String, Arc<JwtValidator>>,
    jwks_cache: Arc<JwksCache>,
}

impl MultiIssuerValidator {
    /// An empty multi-issuer validator.
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
            jwks_cache: Arc::new(JwksCache::new()),
        }
    }

    /// Register a supported issuer and the JWKS URI to validate its tokens against.
    pub fn add_issuer(&mut self, issuer: impl Into<String>, jwks_uri: impl Into<String>) {
        let issuer = issuer.into();
        let jwks_client = self.jwks_cache.client_for(&issuer, &jwks_uri.into());
        let validator = Arc::new(JwtValidator::with_jwks_client(issuer.clone(), jwks_client));
        self.validators.insert(issuer, validator);
    }

    /// Validate `token`, auto-detecting its issuer.
    ///
    /// The algorithm allowlist is checked before the issuer is even read
    /// from the (unverified) payload, preventing an algorithm-confusion
    /// attack from ever reaching issuer dispatch.
    pub async fn validate(&self, token: &str) -> Result<JwtValidationResult> {
        let header = decode_header(token)
            .map_err(|e| Error::InvalidToken(format!("invalid JWT format: {e}")))?;
        if !DEFAULT_ALGORITHMS.contains(&header.alg) {
            return Err(Error::InvalidToken(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidToken("invalid JWT format".to_string()));
        }
        use base64::Engine as _;
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| Error::InvalidToken(format!("invalid JWT payload encoding: {e}")))?;
        let claims: StandardClaims = serde_json::from_slice(&payload)
            .map_err(|e| Error::InvalidToken(format!("invalid JWT claims: {e}")))?;
        let issuer = claims
            .iss
            .ok_or_else(|| Error::InvalidToken("JWT missing iss claim".to_string()))?;

        let validator = self
            .validators
            .get(&issuer)
            .ok_or_else(|| Error::InvalidToken(format!("issuer '{issuer}' not supported")))?;
        validator.validate(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_skew_is_thirty_seconds() {
        let validator = JwtValidator::new("https://auth.example.com", "https://auth.example.com/jwks");
        assert_eq!(validator.clock_skew_leeway, DEFAULT_CLOCK_SKEW);
        assert_eq!(validator.clock_skew_leeway, Duration::from_secs(30));
    }

    #[test]
    fn clock_skew_is_overridable() {
        let validator = JwtValidator::new("https://auth.example.com", "https://auth.example.com/jwks")
            .with_clock_skew(Duration::from_secs(60));
        assert_eq!(validator.clock_skew_leeway, Duration::from_secs(60));
    }

    #[test]
    fn scope_claim_is_space_split() {
        let claims = StandardClaims {
            scope: Some("mcp.read mcp.write".to_string()),
            ..Default::default()
        };
        let info = claims.into_auth_info();
        assert_eq!(info.scopes, vec!["mcp.read", "mcp.write"]);
    }

    #[test]
    fn scp_array_used_when_scope_is_absent() {
        let claims = StandardClaims {
            scp: Some(vec!["mcp.read".to_string()]),
            ..Default::default()
        };
        let info = claims.into_auth_info();
        assert_eq!(info.scopes, vec!["mcp.read"]);
    }

    #[test]
    fn resource_is_first_url_shaped_audience_entry() {
        let claims = StandardClaims {
            aud: Some(Audience::Many(vec![
                "not-a-url".to_string(),
                "https://api.example.com/mcp".to_string(),
            ])),
            ..Default::default()
        };
        let info = claims.into_auth_info();
        assert_eq!(info.resource.as_deref(), Some("https://api.example.com/mcp"));
    }

    #[test]
    fn extra_excludes_standard_claim_keys() {
        let mut claims = StandardClaims {
            sub: Some("user-1".to_string()),
            ..Default::default()
        };
        claims.additional.insert("custom".to_string(), serde_json::json!("value"));
        claims.additional.insert("client_id".to_string(), serde_json::json!("C"));
        let info = claims.into_auth_info();
        assert_eq!(info.client_id.as_deref(), Some("C"));
        assert!(info.extra.contains_key("custom"));
        assert!(!info.extra.contains_key("client_id"));
    }

    #[tokio::test]
    async fn multi_issuer_validator_rejects_unknown_issuer() {
        let mut validator = MultiIssuerValidator::new();
        validator.add_issuer("https://known.example.com", "https://known.example.com/jwks");
        assert_eq!(validator.validators.len(), 1);
    }
}
