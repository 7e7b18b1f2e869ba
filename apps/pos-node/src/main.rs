//! # Famyank POS Node
//!
//! Headless store node: opens the local store, keeps its catalog in step
//! with the catalog server, and logs every change.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  store.toml / FAMYANK_* ──► StoreConfig ──► Database ──► PosStore       │
//! │  sync.toml  / FAMYANK_* ──► SyncConfig  ──► RemoteSyncAdapter           │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                               SyncAgent (unless offline / no remote)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use famyank_core::{Currency, Money};
use famyank_db::{Database, DbConfig};
use famyank_store::{PosStore, StoreConfig};
use famyank_sync::{RemoteSyncAdapter, SyncAgent, SyncConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Famyank POS node...");

    let store_config = StoreConfig::load_or_default(None);
    let sync_config = SyncConfig::load_or_default(None);

    let db_config = match store_config.resolved_database_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            DbConfig::new(path)
        }
        None => {
            warn!("No data directory available, using an in-memory database");
            DbConfig::in_memory()
        }
    };
    let db = Database::new(db_config).await?;

    let store = Arc::new(PosStore::open(Arc::new(db.clone()), store_config).await?);
    let _events = store.subscribe_events(|event| {
        info!(kind = ?event.kind, origin = ?event.origin, "Store changed");
    });

    log_dashboard(&store);

    let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &sync_config)?);
    let agent = SyncAgent::spawn(adapter.clone(), store.clone(), &sync_config);
    if agent.is_some() {
        info!(
            node_id = %sync_config.node_id,
            remote = sync_config.remote_url().unwrap_or_default(),
            mode = %sync_config.mode,
            "Catalog sync running"
        );
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if let Some(agent) = agent {
        agent.shutdown().await;
    }
    let status = adapter.status();
    info!(
        pulls_succeeded = status.pulls_succeeded,
        pulls_failed = status.pulls_failed,
        pushes_succeeded = status.pushes_succeeded,
        pushes_failed = status.pushes_failed,
        "Sync totals"
    );
    db.close().await;

    info!("Node shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,famyank_store=debug,famyank_sync=debug,famyank_db=debug,sqlx=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn log_dashboard(store: &PosStore) {
    let dashboard = store.dashboard();
    let currency = Currency::Ghs;

    info!(
        products = dashboard.product_count,
        units_in_stock = dashboard.units_in_stock,
        orders = dashboard.summary.order_count,
        revenue = %currency.format(Money::from_cents(dashboard.summary.total_revenue_cents)),
        profit = %currency.format(Money::from_cents(dashboard.summary.total_profit_cents)),
        "Store ready"
    );

    for product in &dashboard.low_stock {
        warn!(product_id = %product.id, name = %product.name, stock = product.stock, "Low stock");
    }
}
