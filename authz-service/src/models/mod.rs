pub mod audit_log;
pub mod organization;
pub mod permission;
pub mod role;
pub mod super_admin;
pub mod user;

pub use audit_log::{AuditIntent, AuditLogEntry};
pub use organization::{OrgStatus, Organization, OrganizationResponse};
pub use permission::EffectivePermissions;
pub use role::{Role, RolePatch, RoleResponse, RoleWithCount, ADMIN_ROLE_SLUG};
pub use super_admin::{SanitizedSuperAdmin, SuperAdmin};
pub use user::{PermissionOverride, SanitizedUser, TenantUser};
