//! Tenant context binding and ownership checks.
//!
//! Every tenant-realm data access is scoped to the organization the
//! session token was issued for. The context is bound once per
//! request here; handlers and stores take it as a parameter instead
//! of re-reading claims.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AuthError;
use crate::services::TenantClaims;

/// Anything that belongs to exactly one organization.
pub trait OrgScoped {
    fn organization_id(&self) -> Uuid;
}

/// The organization a request is allowed to touch.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub organization_id: Uuid,
}

impl TenantContext {
    /// Reject resources fetched by id that belong to another tenant.
    pub fn verify_ownership<T: OrgScoped>(&self, resource: &T) -> Result<(), AuthError> {
        if resource.organization_id() != self.organization_id {
            return Err(AuthError::CrossTenantAccess);
        }
        Ok(())
    }
}

/// Bind the tenant context from verified claims. Runs after
/// `auth_middleware`; a tenant token without an organization id is a
/// forgery or a realm mix-up and is rejected outright.
pub async fn tenant_context_middleware(mut req: Request, next: Next) -> Result<Response, AuthError> {
    let claims = req
        .extensions()
        .get::<TenantClaims>()
        .ok_or(AuthError::MissingToken)?;
    let organization_id = claims.org_id.ok_or(AuthError::TenantContextMissing)?;

    req.extensions_mut().insert(TenantContext { organization_id });
    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AuthError::TenantContextMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        organization_id: Uuid,
    }

    impl OrgScoped for Widget {
        fn organization_id(&self) -> Uuid {
            self.organization_id
        }
    }

    #[test]
    fn ownership_check_rejects_foreign_resources() {
        let org = Uuid::new_v4();
        let ctx = TenantContext { organization_id: org };

        assert!(ctx.verify_ownership(&Widget { organization_id: org }).is_ok());

        let foreign = Widget { organization_id: Uuid::new_v4() };
        assert!(matches!(
            ctx.verify_ownership(&foreign),
            Err(AuthError::CrossTenantAccess)
        ));
    }
}
