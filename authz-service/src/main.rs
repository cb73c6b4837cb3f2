use std::net::SocketAddr;
use std::sync::Arc;

use authz_service::{build_router, config::AuthConfig, db, store, AppState};
use platform_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Fail fast on invalid configuration.
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authorization service"
    );

    let store: Arc<dyn store::Store> = if config.database.url == "memory" {
        tracing::warn!("Using the in-process memory store; data is not persisted");
        Arc::new(store::MemoryStore::new())
    } else {
        let pool = db::connect(&config.database).await?;
        Arc::new(store::PgStore::new(pool))
    };

    let state = AppState::new(config.clone(), store);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
