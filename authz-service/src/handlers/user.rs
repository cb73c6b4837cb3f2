//! Tenant user handlers: the self view and per-user permission
//! overrides.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AuthError;
use crate::middleware::{client_ip, user_agent, AuthUser, TenantContext};
use crate::models::{
    permission::validate_known, AuditLogEntry, PermissionOverride, SanitizedUser,
};
use crate::services::{AuthService, PermissionResolver};
use crate::utils::ValidatedJson;
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: SanitizedUser,
    pub role: Option<RoleSummary>,
    /// Live effective permission set, not the login-time snapshot.
    pub permissions: Vec<String>,
    pub is_system_admin: bool,
}

#[derive(Debug, serde::Deserialize, validator::Validate, ToSchema)]
pub struct UpdateOverridesRequest {
    #[serde(default)]
    pub grant: Vec<String>,
    #[serde(default)]
    pub revoke: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverridesResponse {
    pub user_id: Uuid,
    pub grant: Vec<String>,
    pub revoke: Vec<String>,
    pub effective_permissions: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// The caller's own profile with live effective permissions.
///
/// GET /users/me
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Account deactivated")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    _ctx: TenantContext,
) -> Result<Json<MeResponse>, AuthError> {
    let user = state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if !user.active {
        return Err(AuthError::AccountDeactivated);
    }

    let role = state.auth.load_role(&user).await?;
    let is_admin = AuthService::is_system_admin(role.as_ref());
    let base = role
        .as_ref()
        .map(|r| r.permissions.clone())
        .unwrap_or_default();
    let effective = PermissionResolver::resolve(&base, &user.overrides(), is_admin);

    Ok(Json(MeResponse {
        user: user.sanitized(),
        role: role.map(|r| RoleSummary {
            id: r.id,
            slug: r.slug,
            name: r.name,
        }),
        permissions: effective.to_vec(),
        is_system_admin: is_admin,
    }))
}

/// Replace a user's permission overrides.
///
/// PUT /users/{user_id}/permissions
#[utoipa::path(
    put,
    path = "/users/{user_id}/permissions",
    params(("user_id" = Uuid, Path, description = "Target user id")),
    request_body = UpdateOverridesRequest,
    responses(
        (status = 200, description = "Overrides replaced", body = OverridesResponse),
        (status = 403, description = "Self-edit, cross-tenant, or missing permission"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Target holds the system admin role"),
        (status = 422, description = "Unknown permission string")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_overrides(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ctx: TenantContext,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<UpdateOverridesRequest>,
) -> Result<Json<OverridesResponse>, AuthError> {
    validate_known(&req.grant)?;
    validate_known(&req.revoke)?;

    let target = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AuthError::NotFound("User"))?;
    ctx.verify_ownership(&target)?;

    // A principal must not widen its own access.
    if target.id == claims.sub {
        return Err(AuthError::Forbidden(
            "You cannot edit your own permission overrides".to_string(),
        ));
    }

    // Overrides are meaningless on the admin role and would only
    // disguise its unconditional access.
    let target_role = state.auth.load_role(&target).await?;
    if AuthService::is_system_admin(target_role.as_ref()) {
        return Err(AuthError::Conflict(
            "Permission overrides cannot be applied to system admin users".to_string(),
        ));
    }

    let overrides = PermissionOverride {
        grant: req.grant,
        revoke: req.revoke,
    };
    state.store.update_user_overrides(target.id, &overrides).await?;

    let base = target_role
        .as_ref()
        .map(|r| r.permissions.clone())
        .unwrap_or_default();
    let effective = PermissionResolver::resolve(&base, &overrides, false);

    state.audit.log_async(AuditLogEntry::new(
        Some(claims.sub),
        "user.permissions_updated",
        "user",
        Some(target.id.to_string()),
        json!({
            "organization_id": target.organization_id,
            "grant": &overrides.grant,
            "revoke": &overrides.revoke,
        }),
        client_ip(&headers),
        user_agent(&headers),
    ));

    Ok(Json(OverridesResponse {
        user_id: target.id,
        grant: overrides.grant,
        revoke: overrides.revoke,
        effective_permissions: effective.to_vec(),
    }))
}
