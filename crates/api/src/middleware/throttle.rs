//! Request throttling using governor keyed rate limiters.
//!
//! Two quotas apply:
//! - anonymous requests, keyed by client IP
//! - requests carrying a token, keyed by the token's digest
//!
//! A request over quota gets 429 without reaching its handler. Whether the
//! token is valid is not checked here; an invalid token still counts against
//! its own bucket and is rejected by the [`super::Caller`] extractor.

use std::net::{IpAddr, Ipv4Addr};

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use super::token_from_headers;
use crate::config::ThrottleConfig;
use crate::error::AppError;
use crate::services::auth::token_digest;
use crate::state::AppState;

// =============================================================================
// Client IP
// =============================================================================

fn parse_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// The real client IP, from Cloudflare's `CF-Connecting-IP` first and then
/// the standard proxy headers.
///
/// Requests with none of these headers share one anonymous bucket.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> IpAddr {
    parse_ip(headers, "cf-connecting-ip")
        .or_else(|| {
            // First IP in the chain
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| parse_ip(headers, "x-real-ip"))
        .or_else(|| parse_ip(headers, "fly-client-ip"))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

// =============================================================================
// Limiters
// =============================================================================

/// The anonymous and authenticated request throttles.
pub struct Throttle {
    anonymous: DefaultKeyedRateLimiter<IpAddr>,
    authenticated: DefaultKeyedRateLimiter<String>,
}

impl Throttle {
    /// Create throttles with the configured per-minute quotas.
    #[must_use]
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            anonymous: RateLimiter::keyed(Quota::per_minute(config.anon_per_minute)),
            authenticated: RateLimiter::keyed(Quota::per_minute(config.user_per_minute)),
        }
    }

    /// Count one anonymous request. Returns `false` if over quota.
    pub fn check_anonymous(&self, ip: IpAddr) -> bool {
        self.anonymous.check_key(&ip).is_ok()
    }

    /// Count one request for a token. Returns `false` if over quota.
    pub fn check_token(&self, token: &str) -> bool {
        self.authenticated.check_key(&token_digest(token)).is_ok()
    }

    /// Drop buckets that have fully refilled.
    pub fn retain_recent(&self) {
        self.anonymous.retain_recent();
        self.authenticated.retain_recent();
    }
}

/// Middleware that rejects requests over their quota with 429.
pub async fn throttle_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let allowed = match token_from_headers(headers) {
        Some(token) => state.throttle().check_token(token),
        None => state.throttle().check_anonymous(client_ip(headers)),
    };

    if !allowed {
        tracing::warn!(path = %request.uri().path(), "request throttled");
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_client_ip_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.3"));
        assert_eq!(client_ip(&headers).to_string(), "10.0.0.3");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).to_string(), "203.0.113.7");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers).to_string(), "198.51.100.2");
    }

    #[test]
    fn test_quotas_are_per_key() {
        let throttle = Throttle::new(&ThrottleConfig {
            anon_per_minute: NonZeroU32::new(2).unwrap(),
            user_per_minute: NonZeroU32::new(1).unwrap(),
        });
        let a: IpAddr = "192.0.2.1".parse().unwrap();
        let b: IpAddr = "192.0.2.2".parse().unwrap();

        assert!(throttle.check_anonymous(a));
        assert!(throttle.check_anonymous(a));
        assert!(!throttle.check_anonymous(a));
        assert!(throttle.check_anonymous(b));

        assert!(throttle.check_token("one"));
        assert!(!throttle.check_token("one"));
        assert!(throttle.check_token("two"));
    }
}
