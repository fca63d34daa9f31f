//! RFC 8707 resource indicator parsing/normalization and constant-time
//! audience comparison.
//!
//! Grounded on the teacher's resource-URI canonicalization, simplified to
//! this spec's exact rule: "parse URL, strip fragment" (§3 Data Model,
//! `AuthInfo.resource`) rather than the teacher's fuller canonical-form
//! normalization (lowercasing, default-port stripping, trailing-slash
//! removal). Audience comparison additionally strips a trailing `#` on both
//! sides before comparing, per §4.8 step 3(b), and compares in constant time
//! since this runs on the bearer-verification hot path.

use subtle::ConstantTimeEq;
use url::Url;

use crate::error::{Error, Result};

/// Parse `uri` as an absolute URL and strip any fragment, per the `resource`
/// field's definition in §3 Data Model ("parsed URL, fragment stripped").
pub fn normalize_resource(uri: &str) -> Result<String> {
    let mut url = Url::parse(uri)
        .map_err(|e| Error::InvalidRequest(format!("invalid resource URI: {e}")))?;
    url.set_fragment(None);
    Ok(url.into())
}

/// Compare a token's bound resource against an expected audience entry,
/// stripping a trailing `#` from both sides first (§4.8 step 3b), in
/// constant time.
pub fn audience_matches(token_resource: &str, expected: &str) -> bool {
    let a = token_resource.trim_end_matches('#');
    let b = expected.trim_end_matches('#');
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Whether `token_resource` matches any entry in `expected_audience`. An
/// empty `expected_audience` set means audience is not enforced.
pub fn audience_allowed(token_resource: Option<&str>, expected_audience: &[String]) -> bool {
    if expected_audience.is_empty() {
        return true;
    }
    let Some(resource) = token_resource else {
        return false;
    };
    expected_audience
        .iter()
        .any(|expected| audience_matches(resource, expected))
}
