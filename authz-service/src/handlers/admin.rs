//! Elevated-realm handlers: super-admin login, organization
//! lifecycle, and the audit trail.
//!
//! Mutating handlers attach an [`AuditIntent`] to the response; the
//! audit layer persists it only for 2xx outcomes.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AuthError;
use crate::middleware::{client_ip, user_agent};
use crate::models::{
    AuditIntent, AuditLogEntry, OrgStatus, Organization, OrganizationResponse, Role,
    SanitizedSuperAdmin, SanitizedUser, TenantUser,
};
use crate::utils::password::{hash_password, Password};
use crate::utils::ValidatedJson;
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub admin: SanitizedSuperAdmin,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid admin email"))]
    pub admin_email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub admin_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrganizationResponse {
    pub organization: OrganizationResponse,
    pub admin_user: SanitizedUser,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Authenticate a platform super admin.
///
/// POST /admin/login
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    ),
    tag = "Admin"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AuthError> {
    let login = state
        .auth
        .super_admin_login(
            &req.email,
            &req.password,
            &client_ip(&headers),
            &user_agent(&headers),
        )
        .await?;

    tracing::info!(admin_id = %login.admin.id, "Super admin login");

    Ok(Json(AdminLoginResponse {
        token: login.token,
        token_type: "Bearer",
        expires_in: login.expires_in,
        admin: login.admin.sanitized(),
    }))
}

/// List every organization on the platform.
///
/// GET /admin/organizations
#[utoipa::path(
    get,
    path = "/admin/organizations",
    responses(
        (status = 200, description = "All organizations", body = [OrganizationResponse]),
        (status = 401, description = "Missing or invalid super-admin token")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationResponse>>, AuthError> {
    let orgs = state.store.list_organizations().await?;
    Ok(Json(orgs.into_iter().map(OrganizationResponse::from).collect()))
}

/// Provision an organization with its system admin role and first
/// admin user.
///
/// POST /admin/organizations
#[utoipa::path(
    post,
    path = "/admin/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization provisioned", body = CreateOrganizationResponse),
        (status = 409, description = "Admin email already in use"),
        (status = 422, description = "Validation error")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateOrganizationRequest>,
) -> Result<Response, AuthError> {
    if state
        .store
        .find_user_by_email(&req.admin_email)
        .await?
        .is_some()
    {
        return Err(AuthError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let org = Organization::new(req.name);
    state.store.insert_organization(&org).await?;

    let admin_role = Role::system_admin(org.id);
    state.store.insert_role(&admin_role).await?;

    let password_hash = hash_password(&Password::new(req.admin_password))?;
    let admin_user = TenantUser::new(
        org.id,
        req.admin_email,
        password_hash.into_string(),
        Some(admin_role.id),
    );
    state.store.insert_user(&admin_user).await?;

    tracing::info!(
        organization_id = %org.id,
        name = %org.name,
        "Organization provisioned"
    );

    let intent = AuditIntent::new(
        "organization.create",
        "organization",
        Some(org.id.to_string()),
        json!({ "name": &org.name, "admin_user_id": admin_user.id }),
    );

    let body = CreateOrganizationResponse {
        organization: org.into(),
        admin_user: admin_user.sanitized(),
    };
    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    response.extensions_mut().insert(intent);
    Ok(response)
}

/// Suspend an organization, cutting off all of its tenant logins.
///
/// POST /admin/organizations/{org_id}/suspend
#[utoipa::path(
    post,
    path = "/admin/organizations/{org_id}/suspend",
    params(("org_id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization suspended", body = OrganizationResponse),
        (status = 404, description = "Organization not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn suspend_organization(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Response, AuthError> {
    set_status(state, org_id, OrgStatus::Suspended, "organization.suspend").await
}

/// Reactivate a suspended organization.
///
/// POST /admin/organizations/{org_id}/activate
#[utoipa::path(
    post,
    path = "/admin/organizations/{org_id}/activate",
    params(("org_id" = Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization activated", body = OrganizationResponse),
        (status = 404, description = "Organization not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn activate_organization(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Response, AuthError> {
    set_status(state, org_id, OrgStatus::Active, "organization.activate").await
}

async fn set_status(
    state: AppState,
    org_id: Uuid,
    status: OrgStatus,
    action: &str,
) -> Result<Response, AuthError> {
    let org = state
        .store
        .set_organization_status(org_id, status)
        .await?
        .ok_or(AuthError::NotFound("Organization"))?;

    tracing::info!(organization_id = %org.id, status = %org.status, "Organization status changed");

    let intent = AuditIntent::new(
        action,
        "organization",
        Some(org.id.to_string()),
        json!({ "status": &org.status }),
    );

    let mut response = Json(OrganizationResponse::from(org)).into_response();
    response.extensions_mut().insert(intent);
    Ok(response)
}

/// Most recent audit log entries, newest first.
///
/// GET /admin/audit-logs
#[utoipa::path(
    get,
    path = "/admin/audit-logs",
    params(("limit" = Option<i64>, Query, description = "Max entries, default 100")),
    responses(
        (status = 200, description = "Audit trail", body = [AuditLogEntry]),
        (status = 401, description = "Missing or invalid super-admin token")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AuthError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let entries = state.store.list_audit_logs(limit).await?;
    Ok(Json(entries))
}
