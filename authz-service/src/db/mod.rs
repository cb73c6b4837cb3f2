//! Postgres pool bootstrap.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::AuthError;

/// Connect and run pending migrations. Called once at startup;
/// migration failure is fatal.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, AuthError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to connect to Postgres: {}", e)))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Migration failed: {}", e)))?;

    tracing::info!("Database connected and migrated");
    Ok(pool)
}
