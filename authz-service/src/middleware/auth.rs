//! Tenant-realm session verification.
//!
//! Stateless: validates signature, expiry, and realm marker from the
//! token alone, with no store access. Live facts (account activation,
//! current role permissions) are re-derived by the permission gate,
//! not here.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::services::TenantClaims;
use crate::AppState;

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Require a valid tenant session token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.decode_tenant(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Attach tenant claims when a valid token is present, but never
/// reject: anonymous and badly-authenticated callers both pass
/// through without a principal context.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        if let Ok(claims) = state.tokens.decode_tenant(token) {
            req.extensions_mut().insert(claims);
        }
    }
    next.run(req).await
}

/// Extractor for the verified tenant claims.
pub struct AuthUser(pub TenantClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<TenantClaims>()
            .cloned()
            .ok_or(AuthError::MissingToken)?;
        Ok(AuthUser(claims))
    }
}

/// Extractor variant for routes behind `optional_auth_middleware`.
pub struct MaybeAuthUser(pub Option<TenantClaims>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<TenantClaims>().cloned()))
    }
}
