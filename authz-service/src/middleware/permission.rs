//! Route-level permission gate.
//!
//! The gate trusts the token only for identity. Role permissions,
//! per-user overrides, and account status are re-fetched from the
//! store on every gated request, so a role edit or deactivation takes
//! effect on the next call rather than at next login.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::services::{AuthService, PermissionResolver, TenantClaims};
use crate::AppState;

/// How multiple required permissions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Every listed permission must be held.
    All,
    /// Any one of the listed permissions suffices.
    Any,
}

/// State for one gated route group: the requirement plus the shared
/// application state it is checked against.
#[derive(Clone)]
pub struct PermissionGate {
    pub state: AppState,
    pub required: &'static [&'static str],
    pub mode: GateMode,
}

impl PermissionGate {
    pub fn all(state: AppState, required: &'static [&'static str]) -> Self {
        Self {
            state,
            required,
            mode: GateMode::All,
        }
    }

    pub fn any(state: AppState, required: &'static [&'static str]) -> Self {
        Self {
            state,
            required,
            mode: GateMode::Any,
        }
    }
}

/// Enforce the gate. Runs after `auth_middleware` and
/// `tenant_context_middleware`; the live effective permission set is
/// left in request extensions for handlers that need it again.
pub async fn permission_gate(
    State(gate): State<PermissionGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = req
        .extensions()
        .get::<TenantClaims>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    let store = &gate.state.store;

    // A token can outlive the account it was issued for.
    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if !user.active {
        return Err(AuthError::AccountDeactivated);
    }

    let role = gate.state.auth.load_role(&user).await?;
    let base = role
        .as_ref()
        .map(|r| r.permissions.clone())
        .unwrap_or_default();
    let effective = PermissionResolver::resolve(
        &base,
        &user.overrides(),
        AuthService::is_system_admin(role.as_ref()),
    );

    let allowed = match gate.mode {
        GateMode::All => effective.has_all(gate.required),
        GateMode::Any => effective.has_any(gate.required),
    };
    if !allowed {
        let role_slug = role.map(|r| r.slug);
        tracing::warn!(
            user_id = %user.id,
            organization_id = %user.organization_id,
            required = ?gate.required,
            role = ?role_slug,
            "Permission denied"
        );
        return Err(AuthError::InsufficientPermission {
            required: gate.required.iter().map(|p| p.to_string()).collect(),
            role: role_slug,
        });
    }

    req.extensions_mut().insert(effective);
    Ok(next.run(req).await)
}
