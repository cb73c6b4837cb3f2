//! Token issuance and verification.
//!
//! Tokens are stateless HS256 JWTs carrying a `typ` marker that binds
//! them to one realm. A tenant token is never accepted by the elevated
//! realm or vice versa, even when the signature is valid. There is no
//! server-side revocation: logout is a client-side discard and expiry
//! is the only invalidation mechanism.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AuthError;
use crate::models::{SuperAdmin, TenantUser};

pub const TOKEN_TYPE_TENANT: &str = "tenant";
pub const TOKEN_TYPE_SUPER_ADMIN: &str = "super_admin";
pub const PURPOSE_PASSWORD_RESET: &str = "password-reset";

/// Claims of a tenant-realm session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantClaims {
    /// Principal id.
    pub sub: Uuid,
    /// Organization the principal is bound to.
    pub org_id: Option<Uuid>,
    pub role_slug: Option<String>,
    /// Snapshot of the role's permissions at issuance. Advisory only:
    /// the permission gate re-derives the live set on first check.
    pub permissions: Vec<String>,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of an elevated-realm session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperAdminClaims {
    pub sub: Uuid,
    pub email: String,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

/// Single-purpose short-lived token authorizing a password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetClaims {
    pub email: String,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

/// Minimal claim view used to route a token to its realm before the
/// full claim set is deserialized.
#[derive(Debug, Deserialize)]
struct RealmProbe {
    #[serde(default)]
    typ: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    tenant_expiry: Duration,
    super_admin_expiry: Duration,
    password_reset_expiry: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            tenant_expiry: Duration::days(config.tenant_token_expiry_days),
            super_admin_expiry: Duration::minutes(config.super_admin_token_expiry_minutes),
            password_reset_expiry: Duration::minutes(config.password_reset_expiry_minutes),
        }
    }

    pub fn tenant_expiry_seconds(&self) -> i64 {
        self.tenant_expiry.num_seconds()
    }

    pub fn super_admin_expiry_seconds(&self) -> i64 {
        self.super_admin_expiry.num_seconds()
    }

    /// Issue a tenant session token embedding the role permission
    /// snapshot current at login time.
    pub fn issue_tenant(
        &self,
        user: &TenantUser,
        role_slug: Option<String>,
        permission_snapshot: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TenantClaims {
            sub: user.id,
            org_id: Some(user.organization_id),
            role_slug,
            permissions: permission_snapshot,
            typ: TOKEN_TYPE_TENANT.to_string(),
            iat: now.timestamp(),
            exp: (now + self.tenant_expiry).timestamp(),
        };
        self.encode(&claims)
    }

    pub fn issue_super_admin(&self, admin: &SuperAdmin) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SuperAdminClaims {
            sub: admin.id,
            email: admin.email.clone(),
            typ: TOKEN_TYPE_SUPER_ADMIN.to_string(),
            iat: now.timestamp(),
            exp: (now + self.super_admin_expiry).timestamp(),
        };
        self.encode(&claims)
    }

    pub fn issue_password_reset(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = PasswordResetClaims {
            email: email.to_string(),
            purpose: PURPOSE_PASSWORD_RESET.to_string(),
            iat: now.timestamp(),
            exp: (now + self.password_reset_expiry).timestamp(),
        };
        self.encode(&claims)
    }

    pub fn decode_tenant(&self, token: &str) -> Result<TenantClaims, AuthError> {
        let probe = self.probe(token)?;
        match probe.typ.as_deref() {
            Some(TOKEN_TYPE_TENANT) => {}
            Some(_) => return Err(AuthError::WrongTokenType),
            None => return Err(AuthError::InvalidToken),
        }
        self.decode_claims(token)
    }

    pub fn decode_super_admin(&self, token: &str) -> Result<SuperAdminClaims, AuthError> {
        let probe = self.probe(token)?;
        match probe.typ.as_deref() {
            Some(TOKEN_TYPE_SUPER_ADMIN) => {}
            Some(_) => return Err(AuthError::WrongTokenType),
            None => return Err(AuthError::InvalidToken),
        }
        self.decode_claims(token)
    }

    pub fn decode_password_reset(&self, token: &str) -> Result<PasswordResetClaims, AuthError> {
        let probe = self.probe(token)?;
        if probe.purpose.as_deref() != Some(PURPOSE_PASSWORD_RESET) {
            return Err(AuthError::WrongTokenType);
        }
        self.decode_claims(token)
    }

    fn encode<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    /// Validate signature/expiry and read just enough claims to pick
    /// the realm, so a wrong-realm token fails with `WrongTokenType`
    /// rather than a deserialization error.
    fn probe(&self, token: &str) -> Result<RealmProbe, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<RealmProbe>(token, &self.decoding_key, &validation)
            .map_err(map_jwt_error)?;
        Ok(data.claims)
    }

    fn decode_claims<T: serde::de::DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<T>(token, &self.decoding_key, &validation).map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

/// Expiry and malformed/bad-signature failures are distinct on the
/// wire: the client silently refreshes on one and forces re-login on
/// the other.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    }
}
