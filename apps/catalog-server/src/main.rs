//! # Famyank Catalog Server
//!
//! Serves the shared product catalog to POS nodes.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Server                                   │
//! │                                                                         │
//! │  pos-node ───► HTTP (3000) ───► CatalogServer ───► SQLite               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;

use std::sync::Arc;

use famyank_db::{Database, DbConfig};
use famyank_sync::CatalogServer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Famyank catalog server...");

    let config = ServerConfig::load()?;
    info!(
        bind = %config.bind_address(),
        database = ?config.database_path,
        "Configuration loaded"
    );

    let db_config = match &config.database_path {
        Some(path) => DbConfig::new(path),
        None => {
            warn!("FAMYANK_SERVER_DB not set, catalog will not survive a restart");
            DbConfig::in_memory()
        }
    };
    let db = Database::new(db_config).await?;

    let server = CatalogServer::open(Arc::new(db.clone())).await?;
    let handle = server.start(&config.bind_address()).await?;

    shutdown_signal().await;
    handle.shutdown().await;
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,famyank_sync=debug,famyank_db=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
