//! Audit log model - append-only records of privileged actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Append-only audit record. `action` follows `<resource>.<verb>`
/// (e.g. `organization.suspend`, `auth.login_failed`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        actor_id: Option<Uuid>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: Option<String>,
        details: serde_json::Value,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id,
            details,
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            created_at: Utc::now(),
        }
    }
}

/// Audit intent attached to a response by an elevated-realm handler.
///
/// The audit layer turns it into an [`AuditLogEntry`] only when the
/// response is 2xx, so speculative or failed actions never appear in
/// the trail.
#[derive(Debug, Clone)]
pub struct AuditIntent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: serde_json::Value,
}

impl AuditIntent {
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id,
            details,
        }
    }
}
