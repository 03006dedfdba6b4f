/**
 * Authentication Extractor
 *
 * Protects API routes that require a signed-in user. The bearer token from
 * the `Authorization` header is resolved through
 * `SessionManager::require_user`, and handlers receive the username.
 *
 * The live socket cannot send headers from a browser, so the gateway reads
 * its token from the query string instead and does not use this extractor.
 */

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::UserId;

/// Authenticated username, extracted from `Authorization: Bearer <token>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

/// Extract the bearer token from request headers, if present and well-formed
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts);
        if token.is_none() {
            tracing::warn!("[Auth] Missing or malformed Authorization header");
        }
        let username = state.sessions.require_user(token).await?;
        Ok(AuthUser(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("http://example.com/api/projects");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
