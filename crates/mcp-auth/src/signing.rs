//! Signs the access and id tokens the authorization server issues.
//!
//! The teacher's auth crate only ever *consumes* tokens from an external
//! issuer; it has no key-generation or signing code anywhere in it. This is
//! grounded instead on its sibling workspace crate `turbomcp-dpop`, which
//! signs and verifies RSA-backed proofs with the same `jsonwebtoken` +
//! `rsa` pairing used here (`helpers::public_key_to_jwk` builds a
//! `jsonwebtoken::jwk::Jwk` from raw RSA `n`/`e` bytes the same way
//! `rsa_public_jwk` below does). `keys/demo_rsa_private.pem` plays the role
//! of a checked-in demo signing key, swappable for an operator-supplied one
//! in a real deployment — mirroring `airsstack-airsstack`'s mock
//! authorization server, which loads its signing key from a PEM file
//! instead of generating one at runtime.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse,
    RSAKeyParameters, RSAKeyType,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use serde::Serialize;

use crate::error::{Error, Result};

const DEMO_PRIVATE_KEY_PEM: &str = include_str!("../keys/demo_rsa_private.pem");
const DEMO_PUBLIC_KEY_PEM: &str = include_str!("../keys/demo_rsa_public.pem");

/// Key id published in the `kid` header of every token this signer mints,
/// and in the JWKS entry that lets a verifier check them.
pub const DEMO_KEY_ID: &str = "mcp-demo-key-1";

/// Mints RS256-signed JWTs for the authorization server's own token
/// issuance, and exposes the matching public key as a JWKS entry.
pub struct TokenSigner {
    issuer: String,
    key_id: String,
    encoding_key: EncodingKey,
    public_jwk: Jwk,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("issuer", &self.issuer)
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl TokenSigner {
    /// Build a signer from an RSA private key PEM, its matching public key
    /// PEM (used only to publish the JWKS entry), and the issuer string
    /// embedded in every token's `iss` claim.
    pub fn from_rsa_pem(
        issuer: impl Into<String>,
        key_id: impl Into<String>,
        private_key_pem: &str,
        public_key_pem: &str,
    ) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| Error::Internal(format!("invalid RSA private key: {e}")))?;

        let key_id = key_id.into();
        let public_jwk = rsa_public_jwk(public_key_pem, &key_id)?;

        Ok(Self {
            issuer: issuer.into(),
            key_id,
            encoding_key,
            public_jwk,
        })
    }

    /// A signer backed by the embedded demo keypair. Never use this issuer
    /// string or key for a production authorization server; swap in
    /// [`TokenSigner::from_rsa_pem`] with an operator-supplied key instead.
    pub fn demo(issuer: impl Into<String>) -> Self {
        Self::from_rsa_pem(issuer, DEMO_KEY_ID, DEMO_PRIVATE_KEY_PEM, DEMO_PUBLIC_KEY_PEM)
            .expect("the embedded demo keypair is a fixed, known-valid RSA key")
    }

    /// Sign `claims` as an RS256 JWT with this signer's `kid`.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key_id.clone());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("failed to sign token: {e}")))
    }

    /// The issuer string embedded in every token this signer mints.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The JWKS document publishing this signer's public key, served from
    /// the authorization server's `/.well-known/jwks.json`.
    pub fn jwks(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.public_jwk.clone()],
        }
    }
}

/// Build a JWK for an RSA public key, per RFC 7517 §6.3.1 (`n`/`e`
/// base64url-encoded with no padding).
fn rsa_public_jwk(public_key_pem: &str, key_id: &str) -> Result<Jwk> {
    use base64::Engine as _;

    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| Error::Internal(format!("invalid RSA public key: {e}")))?;

    let n = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

    Ok(Jwk {
        common: CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_operations: None,
            key_algorithm: Some(KeyAlgorithm::RS256),
            key_id: Some(key_id.to_string()),
            x509_url: None,
            x509_chain: None,
            x509_sha1_fingerprint: None,
            x509_sha256_fingerprint: None,
        },
        algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
            key_type: RSAKeyType::RSA,
            n,
            e,
        }),
    })
}

/// Current Unix timestamp, for stamping `iat`/`exp` on freshly minted tokens.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::DecodingKey;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Claims {
        sub: String,
        exp: u64,
    }

    #[test]
    fn demo_signer_signs_and_self_verifies() {
        let signer = TokenSigner::demo("https://auth.example.com");
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: now_unix() + 3600,
        };
        let token = signer.sign(&claims).unwrap();

        let jwks = signer.jwks();
        let jwk = jwks.find(DEMO_KEY_ID).unwrap();
        let decoding_key = DecodingKey::from_jwk(jwk).unwrap();
        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        let data = jsonwebtoken::decode::<Claims>(&token, &decoding_key, &validation).unwrap();
        assert_eq!(data.claims.sub, "user-1");
    }

    #[test]
    fn jwks_exposes_the_signer_key_id() {
        let signer = TokenSigner::demo("https://auth.example.com");
        let jwks = signer.jwks();
        assert_eq!(jwks.keys.len(), 1);
        assert!(jwks.find(DEMO_KEY_ID).is_some());
    }
}
