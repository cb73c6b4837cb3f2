use platform_core::{config as core_config, error::AppError};
use secrecy::Secret;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string, or the literal `memory` for the
    /// in-process store (dev only).
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub tenant_token_expiry_days: i64,
    pub super_admin_token_expiry_minutes: i64,
    pub password_reset_expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl AuthConfig {
    /// Load configuration from the environment, failing fast in prod
    /// when a required variable is missing.
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        Ok(AuthConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("authz-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", Some("memory"), is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!("DATABASE_MAX_CONNECTIONS: {}", e)))?,
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .map_err(|e| AppError::ConfigError(anyhow::anyhow!("DATABASE_MIN_CONNECTIONS: {}", e)))?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", Some("dev-only-secret"), is_prod)?),
                tenant_token_expiry_days: parse_env("TENANT_TOKEN_EXPIRY_DAYS", 7, is_prod)?,
                super_admin_token_expiry_minutes: parse_env(
                    "SUPER_ADMIN_TOKEN_EXPIRY_MINUTES",
                    60,
                    is_prod,
                )?,
                password_reset_expiry_minutes: parse_env(
                    "PASSWORD_RESET_EXPIRY_MINUTES",
                    5,
                    is_prod,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        })
    }
}

/// Read an env var; in prod every variable is required, in dev the
/// default applies.
fn get_env(name: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => {
            if is_prod {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Missing required environment variable: {}",
                    name
                )));
            }
            default
                .map(|d| d.to_string())
                .ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "Missing environment variable: {}",
                        name
                    ))
                })
        }
    }
}

fn parse_env(name: &str, default: i64, is_prod: bool) -> Result<i64, AppError> {
    get_env(name, Some(&default.to_string()), is_prod)?
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_known_values() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Prod
        );
        assert!("staging".parse::<Environment>().is_err());
    }
}
