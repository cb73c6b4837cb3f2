//! Role model - organization-scoped permission bundles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::permission;

/// Slug of the immutable per-organization system role.
pub const ADMIN_ROLE_SLUG: &str = "admin";

/// Role entity (organization-scoped).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create a custom (non-system) role.
    pub fn new(
        organization_id: Uuid,
        slug: String,
        name: String,
        description: Option<String>,
        permissions: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            slug,
            name,
            description,
            permissions,
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the per-organization `admin` system role, provisioned
    /// once when the organization is created. Carries the full
    /// registry so token snapshots stay meaningful, though resolution
    /// bypasses the list entirely for this role.
    pub fn system_admin(organization_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            slug: ADMIN_ROLE_SLUG.to_string(),
            name: "Administrator".to_string(),
            description: Some("Full access to every module".to_string()),
            permissions: permission::registry().iter().cloned().collect(),
            is_system: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// System roles and the admin slug are never editable or deletable.
    pub fn is_protected(&self) -> bool {
        self.is_system || self.slug == ADMIN_ROLE_SLUG
    }
}

/// Role annotated with live usage counts for list responses.
#[derive(Debug, Clone, FromRow)]
pub struct RoleWithCount {
    #[sqlx(flatten)]
    pub role: Role,
    pub user_count: i64,
}

/// Partial update applied to a non-system role.
#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub permissions: Option<Vec<String>>,
}

/// Role response for API.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub permission_count: usize,
    pub is_system: bool,
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleResponse {
    pub fn from_role(role: Role, user_count: i64) -> Self {
        Self {
            id: role.id,
            slug: role.slug,
            name: role.name,
            description: role.description,
            permission_count: role.permissions.len(),
            permissions: role.permissions,
            is_system: role.is_system,
            user_count,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

impl From<RoleWithCount> for RoleResponse {
    fn from(r: RoleWithCount) -> Self {
        RoleResponse::from_role(r.role, r.user_count)
    }
}
