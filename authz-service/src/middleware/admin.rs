//! Elevated-realm verification and the audit trail layer.
//!
//! Super-admin tokens are short-lived and the account is re-checked
//! against the store on every request. Mutating admin routes declare
//! an [`AuditIntent`] in their response extensions; the audit layer
//! persists it only when the handler actually succeeded, so denied or
//! failed attempts never masquerade as completed actions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::middleware::auth::bearer_token;
use crate::models::{AuditIntent, AuditLogEntry};
use crate::services::SuperAdminClaims;
use crate::AppState;

/// Best-effort client address for audit records. Proxy headers first,
/// since the service normally sits behind one.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Require a valid super-admin session token backed by a live,
/// active account.
pub async fn super_admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.decode_super_admin(token)?;

    let admin = state
        .store
        .find_super_admin(claims.sub)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if !admin.active {
        return Err(AuthError::AccountDeactivated);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Persist handler-declared audit intents on success.
pub async fn audit_trail_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let actor_id = req
        .extensions()
        .get::<SuperAdminClaims>()
        .map(|claims| claims.sub);
    let ip = client_ip(req.headers());
    let agent = user_agent(req.headers());

    let mut response = next.run(req).await;

    if let Some(intent) = response.extensions_mut().remove::<AuditIntent>() {
        if response.status().is_success() {
            state.audit.log_async(AuditLogEntry::new(
                actor_id,
                intent.action,
                intent.resource_type,
                intent.resource_id,
                intent.details,
                ip,
                agent,
            ));
        } else {
            tracing::debug!(
                action = %intent.action,
                status = %response.status(),
                "Dropping audit intent for unsuccessful response"
            );
        }
    }

    response
}

/// Extractor for the verified super-admin claims.
pub struct AdminUser(pub SuperAdminClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<SuperAdminClaims>()
            .cloned()
            .ok_or(AuthError::MissingToken)?;
        Ok(AdminUser(claims))
    }
}
