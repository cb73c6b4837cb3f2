//! Tenant-realm authentication handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AuthError;
use crate::models::SanitizedUser;
use crate::utils::ValidatedJson;
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: SanitizedUser,
    pub role_slug: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// The response is byte-identical whether or not the account exists.
/// The reset token itself never appears here: it reaches the user
/// through an out-of-band delivery channel only.
#[derive(Debug, Serialize, ToSchema)]
pub struct PasswordResetResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetConfirmRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Authenticate a tenant user.
///
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let login = state.auth.tenant_login(&req.email, &req.password).await?;

    tracing::info!(
        user_id = %login.user.id,
        organization_id = %login.user.organization_id,
        "Tenant login"
    );

    Ok(Json(LoginResponse {
        token: login.token,
        token_type: "Bearer",
        expires_in: login.expires_in,
        user: login.user.sanitized(),
        role_slug: login.role_slug,
    }))
}

/// Request a password reset token.
///
/// POST /auth/password-reset/request
#[utoipa::path(
    post,
    path = "/auth/password-reset/request",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset requested", body = PasswordResetResponse),
        (status = 422, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<PasswordResetResponse>, AuthError> {
    state.auth.issue_password_reset(&req.email).await?;

    Ok(Json(PasswordResetResponse {
        message: "If the account exists, a password reset has been initiated",
    }))
}

/// Consume a reset token and set a new password.
///
/// POST /auth/password-reset/confirm
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 401, description = "Invalid or expired reset token"),
        (status = 422, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    state
        .auth
        .confirm_password_reset(&req.token, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
