//! Auth Middleware
//!
//! Bearer token resolution for protected and optionally-authenticated routes.
//!
//! - [`require_auth`]: rejects the request unless the token maps to an active user
//! - [`optional_auth`]: never rejects; downstream sees `OptionalUser(None)` on any failure
//!
//! Both insert an [`IdentityContext`] into request extensions on success.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::{IdentityContext, IdentityResolver};
use crate::domain::repository::UserRepository;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Message when no bearer credential is present
pub const TOKEN_REQUIRED_MESSAGE: &str = "Access token required";

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that requires a valid bearer token
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Send + Sync + 'static,
{
    let token = extract_bearer_token(req.headers())
        .ok_or(AuthError::Unauthenticated(TOKEN_REQUIRED_MESSAGE))?
        .to_owned();

    let resolver = IdentityResolver::new(state.repo.clone(), state.services.clone());
    let identity = resolver.resolve(&token).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Middleware that resolves a bearer token if one is present
pub async fn optional_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: UserRepository + Send + Sync + 'static,
{
    if let Some(token) = extract_bearer_token(req.headers()).map(str::to_owned) {
        let resolver = IdentityResolver::new(state.repo.clone(), state.services.clone());
        match resolver.resolve(&token).await {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(e @ (AuthError::Store(_) | AuthError::Internal(_))) => {
                tracing::error!(error = %e, "Optional identity resolution failed");
            }
            Err(e) => {
                tracing::debug!(code = e.code(), "Ignoring unusable bearer token");
            }
        }
    }

    next.run(req).await
}

// ============================================================================
// Extractors
// ============================================================================

/// Identity set by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub IdentityContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated(TOKEN_REQUIRED_MESSAGE))
    }
}

/// Identity set by [`optional_auth`], if any
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<IdentityContext>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<IdentityContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_forms() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers("Bearer")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers("abc.def")), None);
    }
}
