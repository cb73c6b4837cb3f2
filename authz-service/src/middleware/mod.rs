pub mod admin;
pub mod auth;
pub mod permission;
pub mod tenant;

pub use admin::{audit_trail_middleware, client_ip, super_admin_middleware, user_agent, AdminUser};
pub use auth::{auth_middleware, optional_auth_middleware, AuthUser, MaybeAuthUser};
pub use permission::{permission_gate, GateMode, PermissionGate};
pub use tenant::{tenant_context_middleware, OrgScoped, TenantContext};
