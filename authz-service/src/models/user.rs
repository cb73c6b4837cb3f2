//! Tenant user model - principals bound to one organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::tenant::OrgScoped;

/// Per-principal permission adjustments layered over the role baseline.
///
/// Replaced wholesale on every update; `revoke` wins over `grant` at
/// resolution time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PermissionOverride {
    #[serde(default)]
    pub grant: Vec<String>,
    #[serde(default)]
    pub revoke: Vec<String>,
}

/// Tenant user entity.
#[derive(Debug, Clone, FromRow)]
pub struct TenantUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub role_id: Option<Uuid>,
    pub grant_overrides: Vec<String>,
    pub revoke_overrides: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantUser {
    pub fn new(
        organization_id: Uuid,
        email: String,
        password_hash: String,
        role_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            email,
            display_name: None,
            password_hash,
            role_id,
            grant_overrides: Vec::new(),
            revoke_overrides: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn overrides(&self) -> PermissionOverride {
        PermissionOverride {
            grant: self.grant_overrides.clone(),
            revoke: self.revoke_overrides.clone(),
        }
    }

    /// Convert to a response shape with no credential material.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            organization_id: self.organization_id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role_id: self.role_id,
            active: self.active,
            created_at: self.created_at,
        }
    }
}

impl OrgScoped for TenantUser {
    fn organization_id(&self) -> Uuid {
        self.organization_id
    }
}

/// User response for API (no sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SanitizedUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
