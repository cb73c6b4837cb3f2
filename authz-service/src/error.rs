//! Authorization error taxonomy.
//!
//! Every variant maps to a fixed HTTP status and a stable snake_case
//! `code` so clients can branch on it (e.g. forcing re-login on
//! `token_expired` but silently retrying on transient failures).
//! Authentication failures stay generic to avoid account enumeration;
//! authorization failures name the unmet requirement because callers
//! are already authenticated.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not valid for this realm")]
    WrongTokenType,

    #[error("Token carries no organization context")]
    TenantContextMissing,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Insufficient permission")]
    InsufficientPermission {
        required: Vec<String>,
        role: Option<String>,
    },

    #[error("Access to this resource is not allowed from your organization")]
    CrossTenantAccess,

    #[error("A role with slug '{0}' already exists in this organization")]
    DuplicateSlug(String),

    #[error("System roles cannot be edited or deleted")]
    SystemRoleImmutable,

    #[error("Role is still assigned to {user_count} user(s)")]
    RoleInUse { user_count: i64 },

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Error envelope serialized to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::WrongTokenType => "wrong_token_type",
            AuthError::TenantContextMissing => "tenant_context_missing",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDeactivated => "account_deactivated",
            AuthError::InsufficientPermission { .. } => "insufficient_permission",
            AuthError::CrossTenantAccess => "cross_tenant_access",
            AuthError::DuplicateSlug(_) => "duplicate_slug",
            AuthError::SystemRoleImmutable => "system_role_immutable",
            AuthError::RoleInUse { .. } => "role_in_use",
            AuthError::UnknownPermission(_) => "unknown_permission",
            AuthError::NotFound(_) => "not_found",
            AuthError::Validation(_) => "validation_error",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Conflict(_) => "conflict",
            AuthError::Store(_) | AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::WrongTokenType
            | AuthError::TenantContextMissing
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            AuthError::AccountDeactivated
            | AuthError::InsufficientPermission { .. }
            | AuthError::CrossTenantAccess
            | AuthError::SystemRoleImmutable
            | AuthError::Forbidden(_) => StatusCode::FORBIDDEN,

            AuthError::DuplicateSlug(_) | AuthError::RoleInUse { .. } | AuthError::Conflict(_) => {
                StatusCode::CONFLICT
            }

            AuthError::UnknownPermission(_) | AuthError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            AuthError::NotFound(_) => StatusCode::NOT_FOUND,

            AuthError::Store(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            // Never leak internals to the client.
            AuthError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                ("Internal server error".to_string(), None)
            }
            AuthError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                ("Internal server error".to_string(), None)
            }
            // Authorization failures carry the unmet requirement so
            // legitimate clients can react.
            AuthError::InsufficientPermission { required, role } => (
                self.to_string(),
                Some(serde_json::json!({
                    "required": required,
                    "role": role,
                })),
            ),
            AuthError::RoleInUse { user_count } => (
                self.to_string(),
                Some(serde_json::json!({ "user_count": user_count })),
            ),
            _ => (self.to_string(), None),
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                code,
                details,
            }),
        )
            .into_response()
    }
}
