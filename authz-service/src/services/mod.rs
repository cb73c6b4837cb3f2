//! Services layer: token issuance, credential verification, permission
//! resolution, and audit recording.

mod audit;
mod auth;
mod resolver;
mod token;

pub use audit::AuditService;
pub use auth::{AuthService, SuperAdminLogin, TenantLogin};
pub use resolver::PermissionResolver;
pub use token::{
    PasswordResetClaims, SuperAdminClaims, TenantClaims, TokenService, PURPOSE_PASSWORD_RESET,
    TOKEN_TYPE_SUPER_ADMIN, TOKEN_TYPE_TENANT,
};
