//! Token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::Identity;
use crate::services::AuthService;
use crate::state::AppState;

/// Authorization scheme for API tokens.
pub const TOKEN_SCHEME: &str = "Token";

/// The token key from an `Authorization: Token <key>` header.
///
/// Returns `None` when the header is absent or uses another scheme; such
/// requests are treated as anonymous.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value
        .trim()
        .split_once(' ')
        .unwrap_or((value.trim(), ""));
    scheme
        .eq_ignore_ascii_case(TOKEN_SCHEME)
        .then_some(key.trim())
}

/// The identity behind the request, if any.
///
/// A request without a token is anonymous. A request with an unknown or
/// revoked token is rejected with 401 before the handler runs.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(caller: Caller) -> impl IntoResponse {
///     match caller.identity() {
///         Some(identity) => format!("Hello, {}!", identity.user.username),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Identity>);

impl Caller {
    /// The authenticated identity, or `None` for anonymous callers.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_headers(&parts.headers) else {
            return Ok(Self(None));
        };

        let identity = AuthService::new(state.store()).identify(token).await?;
        tracing::Span::current().record("user_id", identity.id().as_i32());
        set_sentry_user(&identity.id(), identity.user.username.as_str());

        Ok(Self(Some(identity)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_token_scheme() {
        assert_eq!(token_from_headers(&headers("Token abc123")), Some("abc123"));
        assert_eq!(token_from_headers(&headers("token  abc123 ")), Some("abc123"));
        assert_eq!(token_from_headers(&headers("Token")), Some(""));
        assert_eq!(token_from_headers(&headers("Bearer abc123")), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
