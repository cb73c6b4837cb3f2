//! PostgreSQL store implementation.
//!
//! `users.role_id` carries `ON DELETE RESTRICT`, so a role delete that
//! races a concurrent assignment fails at the constraint instead of
//! leaving a principal dangling; the violation is surfaced as
//! [`StoreError::ForeignKeyRestrict`] and mapped to the same 409 the
//! application-level check produces.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    AuditLogEntry, OrgStatus, Organization, PermissionOverride, Role, RolePatch, RoleWithCount,
    SuperAdmin, TenantUser,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_constraint_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::ForeignKeyRestrict,
            Some(UNIQUE_VIOLATION) => return StoreError::UniqueViolation,
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_organization(&self, org: &Organization) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO organizations (id, name, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.status)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_organization(&self, org_id: Uuid) -> Result<Option<Organization>, StoreError> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE id = $1",
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let orgs = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }

    async fn set_organization_status(
        &self,
        org_id: Uuid,
        status: OrgStatus,
    ) -> Result<Option<Organization>, StoreError> {
        let org = sqlx::query_as::<_, Organization>(
            "UPDATE organizations SET status = $2, updated_at = NOW()
             WHERE id = $1 RETURNING *",
        )
        .bind(org_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn insert_user(&self, user: &TenantUser) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, organization_id, email, display_name, password_hash,
                                role_id, grant_overrides, revoke_overrides, active,
                                created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(user.organization_id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(&user.grant_overrides)
        .bind(&user.revoke_overrides)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<TenantUser>, StoreError> {
        let user = sqlx::query_as::<_, TenantUser>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<TenantUser>, StoreError> {
        let user = sqlx::query_as::<_, TenantUser>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_user_overrides(
        &self,
        user_id: Uuid,
        overrides: &PermissionOverride,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET grant_overrides = $2, revoke_overrides = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(&overrides.grant)
        .bind(&overrides.revoke)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_user_role(
        &self,
        user_id: Uuid,
        role_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET role_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_roles(&self, org_id: Uuid) -> Result<Vec<RoleWithCount>, StoreError> {
        let roles = sqlx::query_as::<_, RoleWithCount>(
            "SELECT r.*, COALESCE(u.cnt, 0)::BIGINT AS user_count
             FROM roles r
             LEFT JOIN (SELECT role_id, COUNT(*) AS cnt FROM users GROUP BY role_id) u
               ON u.role_id = r.id
             WHERE r.organization_id = $1
             ORDER BY r.is_system DESC, r.created_at ASC",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn insert_role(&self, role: &Role) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO roles (id, organization_id, slug, name, description, permissions,
                                is_system, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(role.id)
        .bind(role.organization_id)
        .bind(&role.slug)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.permissions)
        .bind(role.is_system)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_constraint_violation)?;
        Ok(())
    }

    async fn find_role(&self, org_id: Uuid, role_id: Uuid) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE organization_id = $1 AND id = $2",
        )
        .bind(org_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn find_role_by_slug(
        &self,
        org_id: Uuid,
        slug: &str,
    ) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE organization_id = $1 AND slug = $2",
        )
        .bind(org_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn update_role(
        &self,
        org_id: Uuid,
        role_id: Uuid,
        patch: RolePatch,
    ) -> Result<Option<Role>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE organization_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(org_id)
        .bind(role_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut role) = existing else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            role.name = name;
        }
        if let Some(description) = patch.description {
            role.description = description;
        }
        if let Some(permissions) = patch.permissions {
            role.permissions = permissions;
        }

        let updated = sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = $3, description = $4, permissions = $5, updated_at = NOW()
             WHERE organization_id = $1 AND id = $2 RETURNING *",
        )
        .bind(org_id)
        .bind(role_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.permissions)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_role(&self, org_id: Uuid, role_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM roles WHERE organization_id = $1 AND id = $2")
            .bind(org_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_violation)?;
        Ok(())
    }

    async fn count_role_users(&self, org_id: Uuid, role_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND role_id = $2",
        )
        .bind(org_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_super_admin(&self, admin: &SuperAdmin) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO super_admins (id, email, password_hash, active, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(admin.id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.active)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_super_admin(&self, admin_id: Uuid) -> Result<Option<SuperAdmin>, StoreError> {
        let admin =
            sqlx::query_as::<_, SuperAdmin>("SELECT * FROM super_admins WHERE id = $1")
                .bind(admin_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(admin)
    }

    async fn find_super_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<SuperAdmin>, StoreError> {
        let admin =
            sqlx::query_as::<_, SuperAdmin>("SELECT * FROM super_admins WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(admin)
    }

    async fn insert_audit_log(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_logs (id, actor_id, action, resource_type, resource_id,
                                     details, ip_address, user_agent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogEntry>, StoreError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
