//! In-memory sliding-window rate limiting for the authorization-server
//! endpoints (§4.9: "All endpoints are wrapped by... rate-limit...").
//!
//! Grounded on the teacher's `turbomcp-auth::rate_limit::RateLimiter`,
//! trimmed from its per-endpoint `HashMap<(key, endpoint), Vec<Instant>>`
//! tracker down to a single-limit-per-key sliding window (this spec names
//! exactly one concrete limit, `/register`'s 20/hour; other endpoints share
//! a configurable default rather than the teacher's five hand-tuned
//! per-endpoint presets).

use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

/// How many requests a key is allowed within `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Maximum requests within `window`.
    pub requests: u32,
    /// The sliding window duration.
    pub window: Duration,
}

impl RateLimit {
    /// A new limit of `requests` per `window`.
    pub fn new(requests: u32, window: Duration) -> Self {
        Self { requests, window }
    }
}

/// Tracks request timestamps per rate-limit key (e.g. client IP, or
/// `client_id` for registration), evicting everything older than the
/// window on each check.
#[derive(Default)]
pub struct RateLimiter {
    entries: DashMap<String, Mutex<Vec<Instant>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("tracked_keys", &self.entries.len())
            .finish()
    }
}

impl RateLimiter {
    /// An empty limiter with no tracked keys yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `key` against `limit`, returning `true` if it
    /// is allowed, `false` if the key has exceeded `limit` within the
    /// window.
    pub fn check(&self, key: &str, limit: RateLimit) -> bool {
        let now = Instant::now();
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(Vec::new()));
        let mut timestamps = entry.lock();
        let window_start = now.checked_sub(limit.window).unwrap_or(now);
        timestamps.retain(|&t| t >= window_start);

        if timestamps.len() as u32 >= limit.requests {
            false
        } else {
            timestamps.push(now);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_under_the_limit() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::new(3, Duration::from_secs(60));
        assert!(limiter.check("client-a", limit));
        assert!(limiter.check("client-a", limit));
        assert!(limiter.check("client-a", limit));
    }

    #[test]
    fn rejects_the_request_that_exceeds_the_limit() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::new(2, Duration::from_secs(60));
        assert!(limiter.check("client-b", limit));
        assert!(limiter.check("client-b", limit));
        assert!(!limiter.check("client-b", limit));
    }

    #[test]
    fn keys_are_tracked_independently() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::new(1, Duration::from_secs(60));
        assert!(limiter.check("client-c", limit));
        assert!(limiter.check("client-d", limit));
        assert!(!limiter.check("client-c", limit));
    }
}
