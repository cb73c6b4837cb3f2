//! In-memory store, used by local development and the test harness.
//!
//! Mirrors the Postgres semantics closely enough for the HTTP surface
//! to be exercised end to end: organization-scoped role queries, the
//! role-in-use count, and audit append. The `fail_audit` switch lets
//! tests prove that audit write failures never surface to clients.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    AuditLogEntry, OrgStatus, Organization, PermissionOverride, Role, RolePatch, RoleWithCount,
    SuperAdmin, TenantUser,
};

#[derive(Default)]
pub struct MemoryStore {
    organizations: DashMap<Uuid, Organization>,
    users: DashMap<Uuid, TenantUser>,
    roles: DashMap<Uuid, Role>,
    super_admins: DashMap<Uuid, SuperAdmin>,
    audit_logs: Mutex<Vec<AuditLogEntry>>,
    fail_audit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent audit writes fail. Test hook.
    pub fn set_fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of audit entries, newest first. Test hook.
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        let mut entries = self
            .audit_logs
            .lock()
            .expect("audit log mutex poisoned")
            .clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_organization(&self, org: &Organization) -> Result<(), StoreError> {
        self.organizations.insert(org.id, org.clone());
        Ok(())
    }

    async fn find_organization(&self, org_id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.get(&org_id).map(|o| o.clone()))
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let mut orgs: Vec<Organization> =
            self.organizations.iter().map(|o| o.clone()).collect();
        orgs.sort_by_key(|o| o.created_at);
        Ok(orgs)
    }

    async fn set_organization_status(
        &self,
        org_id: Uuid,
        status: OrgStatus,
    ) -> Result<Option<Organization>, StoreError> {
        match self.organizations.get_mut(&org_id) {
            Some(mut org) => {
                org.status = status.as_str().to_string();
                org.updated_at = Utc::now();
                Ok(Some(org.clone()))
            }
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: &TenantUser) -> Result<(), StoreError> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<TenantUser>, StoreError> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<TenantUser>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_user_overrides(
        &self,
        user_id: Uuid,
        overrides: &PermissionOverride,
    ) -> Result<(), StoreError> {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.grant_overrides = overrides.grant.clone();
            user.revoke_overrides = overrides.revoke.clone();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_user_role(
        &self,
        user_id: Uuid,
        role_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.role_id = role_id;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_roles(&self, org_id: Uuid) -> Result<Vec<RoleWithCount>, StoreError> {
        let mut roles: Vec<Role> = self
            .roles
            .iter()
            .filter(|r| r.organization_id == org_id)
            .map(|r| r.clone())
            .collect();
        roles.sort_by(|a, b| {
            b.is_system
                .cmp(&a.is_system)
                .then(a.created_at.cmp(&b.created_at))
        });

        let mut annotated = Vec::with_capacity(roles.len());
        for role in roles {
            let user_count = self
                .users
                .iter()
                .filter(|u| u.role_id == Some(role.id))
                .count() as i64;
            annotated.push(RoleWithCount { role, user_count });
        }
        Ok(annotated)
    }

    async fn insert_role(&self, role: &Role) -> Result<(), StoreError> {
        // Mirrors the UNIQUE (organization_id, slug) constraint.
        let duplicate = self.roles.iter().any(|r| {
            r.organization_id == role.organization_id && r.slug == role.slug && r.id != role.id
        });
        if duplicate {
            return Err(StoreError::UniqueViolation);
        }
        self.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn find_role(&self, org_id: Uuid, role_id: Uuid) -> Result<Option<Role>, StoreError> {
        Ok(self
            .roles
            .get(&role_id)
            .filter(|r| r.organization_id == org_id)
            .map(|r| r.clone()))
    }

    async fn find_role_by_slug(
        &self,
        org_id: Uuid,
        slug: &str,
    ) -> Result<Option<Role>, StoreError> {
        Ok(self
            .roles
            .iter()
            .find(|r| r.organization_id == org_id && r.slug == slug)
            .map(|r| r.clone()))
    }

    async fn update_role(
        &self,
        org_id: Uuid,
        role_id: Uuid,
        patch: RolePatch,
    ) -> Result<Option<Role>, StoreError> {
        match self.roles.get_mut(&role_id) {
            Some(mut role) if role.organization_id == org_id => {
                if let Some(name) = patch.name {
                    role.name = name;
                }
                if let Some(description) = patch.description {
                    role.description = description;
                }
                if let Some(permissions) = patch.permissions {
                    role.permissions = permissions;
                }
                role.updated_at = Utc::now();
                Ok(Some(role.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_role(&self, org_id: Uuid, role_id: Uuid) -> Result<(), StoreError> {
        let in_use = self
            .users
            .iter()
            .any(|u| u.role_id == Some(role_id));
        if in_use {
            return Err(StoreError::ForeignKeyRestrict);
        }
        self.roles
            .remove_if(&role_id, |_, r| r.organization_id == org_id);
        Ok(())
    }

    async fn count_role_users(&self, org_id: Uuid, role_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.organization_id == org_id && u.role_id == Some(role_id))
            .count() as i64)
    }

    async fn insert_super_admin(&self, admin: &SuperAdmin) -> Result<(), StoreError> {
        self.super_admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn find_super_admin(&self, admin_id: Uuid) -> Result<Option<SuperAdmin>, StoreError> {
        Ok(self.super_admins.get(&admin_id).map(|a| a.clone()))
    }

    async fn find_super_admin_by_email(
        &self,
        email: &str,
    ) -> Result<Option<SuperAdmin>, StoreError> {
        Ok(self
            .super_admins
            .iter()
            .find(|a| a.email == email)
            .map(|a| a.clone()))
    }

    async fn insert_audit_log(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit sink offline".to_string()));
        }
        self.audit_logs
            .lock()
            .expect("audit log mutex poisoned")
            .push(entry.clone());
        Ok(())
    }

    async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogEntry>, StoreError> {
        let mut entries = self.audit_entries();
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }
}
