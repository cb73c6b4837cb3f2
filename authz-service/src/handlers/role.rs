//! Role management and the permission catalog.
//!
//! All role reads and writes are scoped to the caller's organization.
//! The per-organization `admin` system role is immutable through this
//! surface.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AuthError;
use crate::middleware::{client_ip, user_agent, AuthUser, MaybeAuthUser, TenantContext};
use crate::models::{
    permission::{validate_known, PERMISSION_GROUPS},
    AuditLogEntry, Role, RolePatch, RoleResponse,
};
use crate::services::{AuthService, PermissionResolver};
use crate::store::StoreError;
use crate::utils::ValidatedJson;
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// Defaults to a slug derived from the name.
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    /// `null` clears the description; omitting the field keeps it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionGroupResponse {
    pub module: &'static str,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCatalogResponse {
    pub groups: Vec<PermissionGroupResponse>,
    /// The caller's live effective set, present when authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective: Option<Vec<String>>,
}

/// Distinguishes an absent field (keep) from an explicit `null`
/// (clear) when paired with `#[serde(default)]`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Lowercase, alphanumeric-and-hyphen slug derived from a display name.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// ============================================================================
// Permission catalog
// ============================================================================

/// The full permission catalog, grouped by module.
///
/// GET /permissions
#[utoipa::path(
    get,
    path = "/permissions",
    responses(
        (status = 200, description = "Permission catalog", body = PermissionCatalogResponse)
    ),
    tag = "Permissions"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    MaybeAuthUser(claims): MaybeAuthUser,
) -> Result<Json<PermissionCatalogResponse>, AuthError> {
    let groups = PERMISSION_GROUPS
        .iter()
        .map(|group| PermissionGroupResponse {
            module: group.module,
            permissions: group
                .actions
                .iter()
                .map(|action| format!("{}.{}", group.module, action))
                .collect(),
        })
        .collect();

    let mut effective = None;
    if let Some(claims) = claims {
        if let Some(user) = state.store.find_user(claims.sub).await? {
            if user.active {
                let role = state.auth.load_role(&user).await?;
                let base = role
                    .as_ref()
                    .map(|r| r.permissions.clone())
                    .unwrap_or_default();
                effective = Some(
                    PermissionResolver::resolve(
                        &base,
                        &user.overrides(),
                        AuthService::is_system_admin(role.as_ref()),
                    )
                    .to_vec(),
                );
            }
        }
    }

    Ok(Json(PermissionCatalogResponse { groups, effective }))
}

// ============================================================================
// Role handlers
// ============================================================================

/// List the organization's roles with live user counts.
///
/// GET /roles
#[utoipa::path(
    get,
    path = "/roles",
    responses(
        (status = 200, description = "Roles for the organization", body = [RoleResponse]),
        (status = 403, description = "Missing roles.view")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<RoleResponse>>, AuthError> {
    let roles = state.store.list_roles(ctx.organization_id).await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// Create a custom role.
///
/// POST /roles
#[utoipa::path(
    post,
    path = "/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 409, description = "Slug already in use"),
        (status = 422, description = "Unknown permission or invalid name")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ctx: TenantContext,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), AuthError> {
    validate_known(&req.permissions)?;

    let slug = match req.slug {
        Some(slug) => slug.trim().to_ascii_lowercase(),
        None => slugify(&req.name),
    };
    if slug.is_empty() {
        return Err(AuthError::Validation(
            "Role name does not produce a usable slug".to_string(),
        ));
    }

    // Uniqueness is per organization; the same slug may exist in
    // another tenant.
    if state
        .store
        .find_role_by_slug(ctx.organization_id, &slug)
        .await?
        .is_some()
    {
        return Err(AuthError::DuplicateSlug(slug));
    }

    let role = Role::new(
        ctx.organization_id,
        slug,
        req.name,
        req.description,
        req.permissions,
    );
    // Backstop for a create racing past the slug check: the unique
    // constraint reports the same conflict the pre-check would have.
    match state.store.insert_role(&role).await {
        Ok(()) => {}
        Err(StoreError::UniqueViolation) => {
            return Err(AuthError::DuplicateSlug(role.slug));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        role_id = %role.id,
        organization_id = %ctx.organization_id,
        slug = %role.slug,
        "Role created"
    );
    state.audit.log_async(AuditLogEntry::new(
        Some(claims.sub),
        "role.create",
        "role",
        Some(role.id.to_string()),
        json!({
            "organization_id": ctx.organization_id,
            "slug": &role.slug,
            "permissions": &role.permissions,
        }),
        client_ip(&headers),
        user_agent(&headers),
    ));

    Ok((
        StatusCode::CREATED,
        Json(RoleResponse::from_role(role, 0)),
    ))
}

/// Edit a custom role's name, description, or permission list.
///
/// PATCH /roles/{role_id}
#[utoipa::path(
    patch,
    path = "/roles/{role_id}",
    params(("role_id" = Uuid, Path, description = "Role id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 403, description = "System role or missing roles.manage"),
        (status = 404, description = "Role not found in this organization"),
        (status = 422, description = "Unknown permission")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ctx: TenantContext,
    Path(role_id): Path<Uuid>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, AuthError> {
    if let Some(permissions) = &req.permissions {
        validate_known(permissions)?;
    }

    // A role in another organization is indistinguishable from a
    // missing one.
    let existing = state
        .store
        .find_role(ctx.organization_id, role_id)
        .await?
        .ok_or(AuthError::NotFound("Role"))?;
    if existing.is_protected() {
        return Err(AuthError::SystemRoleImmutable);
    }

    let patch = RolePatch {
        name: req.name,
        description: req.description,
        permissions: req.permissions,
    };
    let updated = state
        .store
        .update_role(ctx.organization_id, role_id, patch)
        .await?
        .ok_or(AuthError::NotFound("Role"))?;
    let user_count = state
        .store
        .count_role_users(ctx.organization_id, role_id)
        .await?;

    state.audit.log_async(AuditLogEntry::new(
        Some(claims.sub),
        "role.update",
        "role",
        Some(role_id.to_string()),
        json!({
            "organization_id": ctx.organization_id,
            "slug": &updated.slug,
            "permissions": &updated.permissions,
        }),
        client_ip(&headers),
        user_agent(&headers),
    ));

    Ok(Json(RoleResponse::from_role(updated, user_count)))
}

/// Delete a custom role that no user holds.
///
/// DELETE /roles/{role_id}
#[utoipa::path(
    delete,
    path = "/roles/{role_id}",
    params(("role_id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 403, description = "System role or missing roles.manage"),
        (status = 404, description = "Role not found in this organization"),
        (status = 409, description = "Role still assigned to users")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ctx: TenantContext,
    Path(role_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let existing = state
        .store
        .find_role(ctx.organization_id, role_id)
        .await?
        .ok_or(AuthError::NotFound("Role"))?;
    if existing.is_protected() {
        return Err(AuthError::SystemRoleImmutable);
    }

    let user_count = state
        .store
        .count_role_users(ctx.organization_id, role_id)
        .await?;
    if user_count > 0 {
        return Err(AuthError::RoleInUse { user_count });
    }

    // The count above races with concurrent assignments; the store's
    // referential restriction is the backstop.
    match state.store.delete_role(ctx.organization_id, role_id).await {
        Err(StoreError::ForeignKeyRestrict) => {
            let user_count = state
                .store
                .count_role_users(ctx.organization_id, role_id)
                .await?
                .max(1);
            return Err(AuthError::RoleInUse { user_count });
        }
        result => result?,
    }

    state.audit.log_async(AuditLogEntry::new(
        Some(claims.sub),
        "role.delete",
        "role",
        Some(role_id.to_string()),
        json!({
            "organization_id": ctx.organization_id,
            "slug": &existing.slug,
        }),
        client_ip(&headers),
        user_agent(&headers),
    ));

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("Sales Agent"), "sales-agent");
        assert_eq!(slugify("  Support / Tier 2  "), "support-tier-2");
        assert_eq!(slugify("!!!"), "");
    }
}
