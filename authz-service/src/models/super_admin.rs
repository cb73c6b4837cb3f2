//! Platform super-admin model.
//!
//! Super admins live outside every organization and carry no role
//! reference; an active super admin implicitly holds every capability
//! of the elevated realm.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct SuperAdmin {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl SuperAdmin {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn sanitized(&self) -> SanitizedSuperAdmin {
        SanitizedSuperAdmin {
            id: self.id,
            email: self.email.clone(),
            active: self.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SanitizedSuperAdmin {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
}
