//! Credential issuer for both realms.
//!
//! Login failures are deliberately indistinguishable to the caller
//! (generic 401) whether the account is unknown, the password is
//! wrong, the account is deactivated, or the organization is
//! suspended. The elevated realm additionally audits every attempt,
//! successful or not, with the specific reason.

use std::sync::Arc;

use serde_json::json;

use crate::error::AuthError;
use crate::models::{AuditLogEntry, Role, SuperAdmin, TenantUser, ADMIN_ROLE_SLUG};
use crate::services::{AuditService, TokenService};
use crate::store::Store;
use crate::utils::password::{hash_password, verify_password, Password, PasswordHashString};

/// Result of a successful tenant login.
pub struct TenantLogin {
    pub user: TenantUser,
    pub role_slug: Option<String>,
    pub token: String,
    pub expires_in: i64,
}

/// Result of a successful super-admin login.
pub struct SuperAdminLogin {
    pub admin: SuperAdmin,
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    audit: AuditService,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, audit: AuditService) -> Self {
        Self {
            store,
            tokens,
            audit,
        }
    }

    /// Authenticate a tenant user and issue a session token carrying
    /// the role permission snapshot current at this moment.
    pub async fn tenant_login(&self, email: &str, password: &str) -> Result<TenantLogin, AuthError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.active {
            return Err(AuthError::InvalidCredentials);
        }

        let org = self
            .store
            .find_organization(user.organization_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !org.is_active() {
            return Err(AuthError::InvalidCredentials);
        }

        verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| AuthError::InvalidCredentials)?;

        let role = self.load_role(&user).await?;
        let role_slug = role.as_ref().map(|r| r.slug.clone());
        let snapshot = role.map(|r| r.permissions).unwrap_or_default();

        let token = self.tokens.issue_tenant(&user, role_slug.clone(), snapshot)?;

        tracing::info!(
            user_id = %user.id,
            organization_id = %user.organization_id,
            role = role_slug.as_deref().unwrap_or("-"),
            "Tenant login"
        );

        Ok(TenantLogin {
            expires_in: self.tokens.tenant_expiry_seconds(),
            role_slug,
            token,
            user,
        })
    }

    /// Authenticate a platform super admin. Every attempt is audited,
    /// with the reason on failure; credential material never reaches
    /// the audit record.
    pub async fn super_admin_login(
        &self,
        email: &str,
        password: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<SuperAdminLogin, AuthError> {
        let admin = match self.store.find_super_admin_by_email(email).await? {
            Some(admin) => admin,
            None => {
                self.audit_login_failure(email, "unknown_account", ip_address, user_agent);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !admin.active {
            self.audit_login_failure(email, "account_deactivated", ip_address, user_agent);
            return Err(AuthError::InvalidCredentials);
        }

        if verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(admin.password_hash.clone()),
        )
        .is_err()
        {
            self.audit_login_failure(email, "invalid_password", ip_address, user_agent);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue_super_admin(&admin)?;

        self.audit.log_async(AuditLogEntry::new(
            Some(admin.id),
            "auth.login",
            "auth",
            None,
            json!({ "email": email }),
            ip_address,
            user_agent,
        ));

        tracing::info!(admin_id = %admin.id, "Super admin login");

        Ok(SuperAdminLogin {
            expires_in: self.tokens.super_admin_expiry_seconds(),
            token,
            admin,
        })
    }

    /// Issue a short-lived single-purpose reset token. The token never
    /// travels back to the caller: delivery belongs to an out-of-band
    /// channel, and the HTTP endpoint answers identically whether the
    /// account exists or not. Unknown and inactive accounts are a
    /// silent no-op.
    pub async fn issue_password_reset(&self, email: &str) -> Result<(), AuthError> {
        match self.store.find_user_by_email(email).await? {
            Some(user) if user.active => {
                let token = self.tokens.issue_password_reset(email)?;
                tracing::info!(user_id = %user.id, "Password reset token issued");
                tracing::debug!(reset_token = %token, "Reset token for out-of-band delivery");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Consume a reset token and replace the account password.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let claims = self.tokens.decode_password_reset(token)?;

        let user = self
            .store
            .find_user_by_email(&claims.email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let hash = hash_password(&Password::new(new_password.to_string()))?;
        self.store
            .update_user_password(user.id, hash.as_str())
            .await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// The principal's role, scoped to their own organization.
    pub async fn load_role(&self, user: &TenantUser) -> Result<Option<Role>, AuthError> {
        match user.role_id {
            Some(role_id) => Ok(self
                .store
                .find_role(user.organization_id, role_id)
                .await?),
            None => Ok(None),
        }
    }

    /// Whether the user holds the per-organization system admin role.
    pub fn is_system_admin(role: Option<&Role>) -> bool {
        role.map(|r| r.slug == ADMIN_ROLE_SLUG).unwrap_or(false)
    }

    fn audit_login_failure(&self, email: &str, reason: &str, ip: &str, user_agent: &str) {
        self.audit.log_async(AuditLogEntry::new(
            None,
            "auth.login_failed",
            "auth",
            None,
            json!({ "email": email, "reason": reason }),
            ip,
            user_agent,
        ));
    }
}
