//! # Remote Sync Adapter
//!
//! Reconciles the local catalog with the remote one. Neither direction ever
//! returns an error to the caller: each call produces a [`SyncOutcome`] that
//! goes to the observer and into the [`SyncStatus`] snapshot.
//!
//! ## Pull
//! ```text
//! pull_remote()
//!    │
//!    ├── offline / no remote ─────────────► Skipped
//!    ├── GET /api/products fails ─────────► Failed   (local catalog untouched)
//!    ├── local catalog changed during GET ► Skipped  (local catalog kept)
//!    ├── replace_catalog(.., Remote) fails ► Failed
//!    └── replaced ────────────────────────► Success { count }
//! ```
//!
//! The catalog generation is read before the GET and checked again under the
//! store's writer gate, so a sale committed while the request is in flight is
//! never overwritten by the older remote stock.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use famyank_core::Product;
use famyank_store::{ChangeOrigin, PosStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::CatalogClient;
use crate::config::{SyncConfig, SyncMode};
use crate::error::SyncResult;

// =============================================================================
// Outcomes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    Pull,
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success { count: usize },
    Failed { reason: String },
    Skipped { reason: String },
}

/// The result of one pull or push attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub direction: SyncDirection,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    pub finished_at: DateTime<Utc>,
}

impl SyncOutcome {
    fn new(direction: SyncDirection, status: OutcomeStatus) -> Self {
        SyncOutcome {
            direction,
            status,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }
}

/// Counters and the latest outcome per direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub pulls_succeeded: u64,
    pub pulls_failed: u64,
    pub pushes_succeeded: u64,
    pub pushes_failed: u64,
    pub skipped: u64,
    pub last_pull: Option<SyncOutcome>,
    pub last_push: Option<SyncOutcome>,
}

impl SyncStatus {
    fn record(&mut self, outcome: &SyncOutcome) {
        match (&outcome.status, outcome.direction) {
            (OutcomeStatus::Skipped { .. }, _) => self.skipped += 1,
            (OutcomeStatus::Success { .. }, SyncDirection::Pull) => self.pulls_succeeded += 1,
            (OutcomeStatus::Failed { .. }, SyncDirection::Pull) => self.pulls_failed += 1,
            (OutcomeStatus::Success { .. }, SyncDirection::Push) => self.pushes_succeeded += 1,
            (OutcomeStatus::Failed { .. }, SyncDirection::Push) => self.pushes_failed += 1,
        }
        match outcome.direction {
            SyncDirection::Pull => self.last_pull = Some(outcome.clone()),
            SyncDirection::Push => self.last_push = Some(outcome.clone()),
        }
    }
}

// =============================================================================
// Observers
// =============================================================================

/// Receives every sync outcome, so a stalled loop is visible.
pub trait SyncObserver: Send + Sync {
    fn on_outcome(&self, outcome: &SyncOutcome);
}

/// No-op observer for when outcomes are only read from [`SyncStatus`].
pub struct NoOpObserver;

impl SyncObserver for NoOpObserver {
    fn on_outcome(&self, _outcome: &SyncOutcome) {}
}

/// Logs outcomes: info on success, warn on failure.
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_outcome(&self, outcome: &SyncOutcome) {
        match &outcome.status {
            OutcomeStatus::Success { count } => {
                info!(direction = ?outcome.direction, count, "Catalog sync succeeded")
            }
            OutcomeStatus::Failed { reason } => {
                warn!(direction = ?outcome.direction, %reason, "Catalog sync failed")
            }
            OutcomeStatus::Skipped { reason } => {
                debug!(direction = ?outcome.direction, %reason, "Catalog sync skipped")
            }
        }
    }
}

// =============================================================================
// Adapter
// =============================================================================

const STALE_PULL_REASON: &str = "local catalog changed during fetch";

pub struct RemoteSyncAdapter {
    store: Arc<PosStore>,
    client: Option<CatalogClient>,
    mode: SyncMode,
    observer: Arc<dyn SyncObserver>,
    status: Mutex<SyncStatus>,
}

impl RemoteSyncAdapter {
    /// Builds the adapter. With no remote URL or in offline mode it is still
    /// usable; every call reports `Skipped`.
    pub fn new(store: Arc<PosStore>, config: &SyncConfig) -> SyncResult<Self> {
        let client = match config.remote_url() {
            Some(url) if config.mode.allows_pull() => Some(CatalogClient::new(
                url,
                config.request_timeout(),
                config.node_id.clone(),
            )?),
            _ => None,
        };

        Ok(RemoteSyncAdapter {
            store,
            client,
            mode: config.mode,
            observer: Arc::new(TracingObserver),
            status: Mutex::new(SyncStatus::default()),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Whether there is a remote to talk to.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Fetches the remote catalog and replaces the local one with it.
    ///
    /// Returns whether the local catalog now matches the remote.
    pub async fn pull_remote(&self) -> bool {
        let status = match &self.client {
            None => OutcomeStatus::Skipped {
                reason: self.skip_reason(),
            },
            Some(client) => {
                let generation = self.store.catalog_generation();
                match client.fetch_products().await {
                    Err(e) => OutcomeStatus::Failed {
                        reason: e.to_string(),
                    },
                    Ok(products) => match self
                        .store
                        .replace_catalog_if_unchanged(products, ChangeOrigin::Remote, generation)
                        .await
                    {
                        Ok(Some(count)) => OutcomeStatus::Success { count },
                        Ok(None) => OutcomeStatus::Skipped {
                            reason: STALE_PULL_REASON.to_string(),
                        },
                        Err(e) => OutcomeStatus::Failed {
                            reason: e.to_string(),
                        },
                    },
                }
            }
        };

        self.report(SyncOutcome::new(SyncDirection::Pull, status))
            .is_success()
    }

    /// Uploads `products` as the whole remote catalog. Failures are
    /// reported, never returned.
    pub async fn push_local(&self, products: &[Product]) {
        let status = match &self.client {
            Some(client) if self.mode.allows_push() => {
                match client.put_products(products).await {
                    Ok(count) => OutcomeStatus::Success { count },
                    Err(e) => OutcomeStatus::Failed {
                        reason: e.to_string(),
                    },
                }
            }
            _ => OutcomeStatus::Skipped {
                reason: self.skip_reason(),
            },
        };

        self.report(SyncOutcome::new(SyncDirection::Push, status));
    }

    /// Pushes the store's current catalog.
    pub async fn push_current(&self) {
        let products = self.store.products();
        self.push_local(&products).await;
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent outcome in either direction.
    pub fn last_outcome(&self) -> Option<SyncOutcome> {
        let status = self.status();
        match (status.last_pull, status.last_push) {
            (Some(pull), Some(push)) => Some(if push.finished_at >= pull.finished_at {
                push
            } else {
                pull
            }),
            (pull, push) => pull.or(push),
        }
    }

    fn skip_reason(&self) -> String {
        match (self.mode, &self.client) {
            (SyncMode::Offline, _) => "sync mode is offline".to_string(),
            (SyncMode::PullOnly, Some(_)) => "sync mode is pull_only".to_string(),
            _ => "no remote configured".to_string(),
        }
    }

    fn report(&self, outcome: SyncOutcome) -> SyncOutcome {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&outcome);
        self.observer.on_outcome(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::CatalogServer;
    use famyank_core::{CartLine, StaffRef};
    use famyank_db::MemoryBackend;
    use famyank_store::StoreConfig;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.into(),
            sku: format!("SKU-{}", id),
            name: format!("Remote {}", id),
            description: String::new(),
            category: "Accessories".into(),
            price_cents: 2_000,
            cost_cents: 800,
            stock,
            image: String::new(),
        }
    }

    async fn local_store() -> Arc<PosStore> {
        Arc::new(
            PosStore::open(Arc::new(MemoryBackend::new()), StoreConfig::default())
                .await
                .unwrap(),
        )
    }

    fn config(url: Option<String>, mode: SyncMode) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.remote.url = url;
        config.remote.request_timeout_secs = 2;
        config.mode = mode;
        config
    }

    /// A port nothing listens on.
    async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    /// Serves `products` on `GET /api/products` only after `delay`.
    async fn slow_remote(products: Vec<Product>, delay: Duration) -> (String, JoinHandle<()>) {
        let app = axum::Router::new().route(
            "/api/products",
            axum::routing::get(move || {
                let products = products.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    axum::Json(products)
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (url, task)
    }

    struct Recorder(Mutex<Vec<SyncOutcome>>);

    impl SyncObserver for Recorder {
        fn on_outcome(&self, outcome: &SyncOutcome) {
            self.0.lock().unwrap().push(outcome.clone());
        }
    }

    #[tokio::test]
    async fn test_pull_replaces_local_catalog() {
        let server = CatalogServer::open(Arc::new(MemoryBackend::new())).await.unwrap();
        server.replace(vec![product("R1", 3), product("R2", 9)]).await.unwrap();
        let handle = server.start("127.0.0.1:0").await.unwrap();

        let store = local_store().await;
        let adapter =
            RemoteSyncAdapter::new(store.clone(), &config(Some(handle.url()), SyncMode::PullPush))
                .unwrap();

        assert!(adapter.pull_remote().await);
        let ids: Vec<_> = store.products().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
        assert_eq!(adapter.status().pulls_succeeded, 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_push_then_pull_round_trip() {
        let handle = CatalogServer::open(Arc::new(MemoryBackend::new()))
            .await
            .unwrap()
            .start("127.0.0.1:0")
            .await
            .unwrap();

        let store = local_store().await;
        let adapter =
            RemoteSyncAdapter::new(store.clone(), &config(Some(handle.url()), SyncMode::PullPush))
                .unwrap();

        adapter.push_current().await;
        assert_eq!(
            adapter.last_outcome().map(|o| o.status),
            Some(OutcomeStatus::Success { count: 4 })
        );

        let other = local_store().await;
        other.restore_defaults().await.unwrap();
        let other_adapter =
            RemoteSyncAdapter::new(other.clone(), &config(Some(handle.url()), SyncMode::PullOnly))
                .unwrap();
        assert!(other_adapter.pull_remote().await);
        assert_eq!(other.products(), store.products());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_remote_degrades() {
        let store = local_store().await;
        let before = store.products();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let adapter =
            RemoteSyncAdapter::new(store.clone(), &config(Some(dead_url().await), SyncMode::PullPush))
                .unwrap()
                .with_observer(recorder.clone());

        assert!(!adapter.pull_remote().await);
        adapter.push_local(&before).await;

        assert_eq!(store.products(), before);
        let status = adapter.status();
        assert_eq!(status.pulls_failed, 1);
        assert_eq!(status.pushes_failed, 1);

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0].status, OutcomeStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_offline_and_pull_only_skip() {
        let store = local_store().await;

        let offline =
            RemoteSyncAdapter::new(store.clone(), &config(Some(dead_url().await), SyncMode::Offline))
                .unwrap();
        assert!(!offline.is_enabled());
        assert!(!offline.pull_remote().await);
        offline.push_current().await;
        assert_eq!(offline.status().skipped, 2);
        assert_eq!(
            offline.status().last_pull.map(|o| o.status),
            Some(OutcomeStatus::Skipped {
                reason: "sync mode is offline".into()
            })
        );

        let pull_only =
            RemoteSyncAdapter::new(store, &config(Some(dead_url().await), SyncMode::PullOnly))
                .unwrap();
        pull_only.push_current().await;
        assert_eq!(pull_only.status().skipped, 1);
        assert_eq!(pull_only.status().pushes_failed, 0);
    }

    #[tokio::test]
    async fn test_rejected_push_reports_failure() {
        let handle = CatalogServer::open(Arc::new(MemoryBackend::new()))
            .await
            .unwrap()
            .start("127.0.0.1:0")
            .await
            .unwrap();

        let store = local_store().await;
        let adapter =
            RemoteSyncAdapter::new(store.clone(), &config(Some(handle.url()), SyncMode::PullPush))
                .unwrap();
        let mut bad = product("X", 1);
        bad.stock = -5;
        adapter.push_local(&[bad]).await;
        let status = adapter.status();
        assert_eq!(status.pushes_failed, 1);
        assert!(matches!(
            status.last_push.map(|o| o.status),
            Some(OutcomeStatus::Failed { reason }) if reason.contains("400")
        ));

        // The server kept its empty catalog, so pulling empties the local one.
        assert!(adapter.pull_remote().await);
        assert!(store.products().is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sale_during_slow_pull_is_kept() {
        let (url, remote) = slow_remote(vec![product("A", 10)], Duration::from_millis(300)).await;
        let store = local_store().await;
        store
            .replace_catalog(vec![product("A", 10)], ChangeOrigin::Local)
            .await
            .unwrap();
        let adapter = Arc::new(
            RemoteSyncAdapter::new(store.clone(), &config(Some(url), SyncMode::PullPush)).unwrap(),
        );

        let pull = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.pull_remote().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        store
            .execute_sale(&[CartLine::new("A", 3)], &StaffRef::new("u1", "Admin Francisca"))
            .await
            .unwrap();

        assert!(!pull.await.unwrap());
        assert_eq!(store.product("A").unwrap().stock, 7);
        assert_eq!(store.sales().len(), 1);
        assert_eq!(
            adapter.status().last_pull.map(|o| o.status),
            Some(OutcomeStatus::Skipped {
                reason: STALE_PULL_REASON.into()
            })
        );

        // Nothing committed during this one, so it applies.
        assert!(adapter.pull_remote().await);
        assert_eq!(adapter.status().pulls_succeeded, 1);

        remote.abort();
    }
}
