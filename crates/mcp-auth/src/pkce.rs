//! RFC 7636 Proof Key for Code Exchange, `S256` only (plain is rejected per
//! OAuth 2.1 and this spec's `/authorize` validation).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

const VERIFIER_MIN_LEN: usize = 43;
const VERIFIER_MAX_LEN: usize = 128;

/// Whether `verifier` is a syntactically valid PKCE code verifier: 43-128
/// characters from the unreserved charset `[A-Za-z0-9-._~]`.
pub fn is_valid_verifier(verifier: &str) -> bool {
    let len = verifier.len();
    (VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN).contains(&len)
        && verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Whether `challenge` is syntactically valid: 43-128 base64url characters
/// that decode to exactly 32 bytes (a SHA-256 digest).
pub fn is_valid_challenge(challenge: &str) -> bool {
    let len = challenge.len();
    if !(VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN).contains(&len) {
        return false;
    }
    URL_SAFE_NO_PAD
        .decode(challenge)
        .map(|bytes| bytes.len() == 32)
        .unwrap_or(false)
}

/// `BASE64URL(SHA256(verifier))`.
pub fn challenge_for_verifier(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Whether `verifier` hashes to `challenge` under `S256`.
pub fn verify(verifier: &str, challenge: &str) -> bool {
    challenge_for_verifier(verifier) == challenge
}
