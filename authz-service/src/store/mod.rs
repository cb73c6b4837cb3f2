//! Storage abstraction.
//!
//! The service talks to storage through the [`Store`] trait object so
//! the HTTP surface, middleware, and tests are independent of the
//! backend. [`PgStore`] is the production implementation;
//! [`MemoryStore`] backs local development and the integration test
//! harness.
//!
//! The storage layer does not enforce tenant isolation by itself:
//! every role query here is organization-scoped by contract, and
//! resources fetched by bare id must go through
//! `TenantContext::verify_ownership` before they are returned or
//! mutated.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AuditLogEntry, OrgStatus, Organization, PermissionOverride, Role, RolePatch, RoleWithCount,
    SuperAdmin, TenantUser,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Operation blocked by a foreign key restriction")]
    ForeignKeyRestrict,

    #[error("Operation violated a uniqueness constraint")]
    UniqueViolation,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Organizations
    // ------------------------------------------------------------------

    async fn insert_organization(&self, org: &Organization) -> Result<(), StoreError>;
    async fn find_organization(&self, org_id: Uuid) -> Result<Option<Organization>, StoreError>;
    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError>;
    async fn set_organization_status(
        &self,
        org_id: Uuid,
        status: OrgStatus,
    ) -> Result<Option<Organization>, StoreError>;

    // ------------------------------------------------------------------
    // Tenant users
    // ------------------------------------------------------------------

    async fn insert_user(&self, user: &TenantUser) -> Result<(), StoreError>;
    async fn find_user(&self, user_id: Uuid) -> Result<Option<TenantUser>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<TenantUser>, StoreError>;
    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError>;
    /// Wholesale replacement of a user's override record.
    async fn update_user_overrides(
        &self,
        user_id: Uuid,
        overrides: &PermissionOverride,
    ) -> Result<(), StoreError>;
    async fn set_user_role(&self, user_id: Uuid, role_id: Option<Uuid>)
        -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Roles (all queries organization-scoped)
    // ------------------------------------------------------------------

    /// All roles for the organization, system roles first, each with a
    /// live count of principals referencing it.
    async fn list_roles(&self, org_id: Uuid) -> Result<Vec<RoleWithCount>, StoreError>;
    async fn insert_role(&self, role: &Role) -> Result<(), StoreError>;
    async fn find_role(&self, org_id: Uuid, role_id: Uuid) -> Result<Option<Role>, StoreError>;
    async fn find_role_by_slug(&self, org_id: Uuid, slug: &str)
        -> Result<Option<Role>, StoreError>;
    async fn update_role(
        &self,
        org_id: Uuid,
        role_id: Uuid,
        patch: RolePatch,
    ) -> Result<Option<Role>, StoreError>;
    async fn delete_role(&self, org_id: Uuid, role_id: Uuid) -> Result<(), StoreError>;
    async fn count_role_users(&self, org_id: Uuid, role_id: Uuid) -> Result<i64, StoreError>;

    // ------------------------------------------------------------------
    // Super admins
    // ------------------------------------------------------------------

    async fn insert_super_admin(&self, admin: &SuperAdmin) -> Result<(), StoreError>;
    async fn find_super_admin(&self, admin_id: Uuid) -> Result<Option<SuperAdmin>, StoreError>;
    async fn find_super_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<SuperAdmin>, StoreError>;

    // ------------------------------------------------------------------
    // Audit log
    // ------------------------------------------------------------------

    async fn insert_audit_log(&self, entry: &AuditLogEntry) -> Result<(), StoreError>;
    async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogEntry>, StoreError>;
}
