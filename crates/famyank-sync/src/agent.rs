//! # Sync Agent
//!
//! Background task that drives the adapter.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             SyncAgent                                   │
//! │                                                                         │
//! │   interval tick (first one immediate) ──► pull_remote()                 │
//! │                                                                         │
//! │   local catalog change ──► push signal ──► push_local(store.products()) │
//! │     (origin Local only, coalesced: at most one pending)                 │
//! │                                                                         │
//! │   shutdown ──► break, unsubscribe                                       │
//! │                                                                         │
//! │   arms are polled in order: push, pull, shutdown                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed cycle just waits for the next tick.

use std::sync::Arc;
use std::time::Duration;

use famyank_store::{ChangeOrigin, PosStore, Subscription};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::adapter::RemoteSyncAdapter;
use crate::config::SyncConfig;

/// Timing and push policy for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub poll_interval: Duration,
    pub push_on_change: bool,
}

impl AgentSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        AgentSettings {
            poll_interval: config.poll_interval(),
            push_on_change: config.push_on_change,
        }
    }
}

pub struct SyncAgent;

/// Handle for a running agent.
pub struct SyncAgentHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncAgentHandle {
    /// Stops the loop and waits for it to unsubscribe.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Sync agent task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl SyncAgent {
    /// Starts the agent, or returns `None` when sync is disabled.
    pub fn spawn(
        adapter: Arc<RemoteSyncAdapter>,
        store: Arc<PosStore>,
        config: &SyncConfig,
    ) -> Option<SyncAgentHandle> {
        if !config.is_sync_enabled() || !adapter.is_enabled() {
            info!(mode = %config.mode, "Catalog sync disabled");
            return None;
        }
        Some(Self::spawn_with(adapter, store, AgentSettings::from_config(config)))
    }

    /// Starts the agent with explicit settings.
    pub fn spawn_with(
        adapter: Arc<RemoteSyncAdapter>,
        store: Arc<PosStore>,
        settings: AgentSettings,
    ) -> SyncAgentHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let push_enabled = settings.push_on_change && adapter.mode().allows_push();

        let (push_tx, push_rx) = mpsc::channel::<()>(1);
        let subscription = push_enabled.then(|| {
            store.subscribe_events(move |event| {
                if event.origin == ChangeOrigin::Local && event.kind.affects_catalog() {
                    // A full channel already holds a pending push.
                    let _ = push_tx.try_send(());
                }
            })
        });

        info!(
            poll_interval_ms = settings.poll_interval.as_millis() as u64,
            push_enabled,
            "Sync agent starting"
        );

        let task = tokio::spawn(run(
            adapter,
            settings,
            push_enabled,
            push_rx,
            shutdown_rx,
            subscription,
        ));

        SyncAgentHandle { shutdown_tx, task }
    }
}

async fn run(
    adapter: Arc<RemoteSyncAdapter>,
    settings: AgentSettings,
    push_enabled: bool,
    mut push_rx: mpsc::Receiver<()>,
    mut shutdown_rx: mpsc::Receiver<()>,
    subscription: Option<Subscription>,
) {
    let mut interval = tokio::time::interval(settings.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // A pending push goes out before the next pull so local changes are
        // uploaded, not overwritten.
        tokio::select! {
            biased;

            Some(()) = push_rx.recv(), if push_enabled => {
                adapter.push_current().await;
            }

            _ = interval.tick() => {
                if !adapter.pull_remote().await {
                    debug!("Pull did not complete, retrying next tick");
                }
            }

            _ = shutdown_rx.recv() => {
                info!("Sync agent shutting down");
                break;
            }
        }
    }

    if let Some(subscription) = subscription {
        subscription.unsubscribe();
    }
    info!("Sync agent stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CatalogClient;
    use crate::config::SyncMode;
    use crate::server::{CatalogServer, CatalogServerHandle};
    use famyank_core::Product;
    use famyank_db::MemoryBackend;
    use famyank_store::StoreConfig;

    fn product(id: &str) -> Product {
        Product {
            id: id.into(),
            sku: format!("SKU-{}", id),
            name: format!("Item {}", id),
            description: String::new(),
            category: "Accessories".into(),
            price_cents: 1_500,
            cost_cents: 700,
            stock: 5,
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

    async fn remote(products: Vec<Product>) -> CatalogServerHandle {
        let server = CatalogServer::open(Arc::new(MemoryBackend::new())).await.unwrap();
        server.replace(products).await.unwrap();
        server.start("127.0.0.1:0").await.unwrap()
    }

    fn config(url: Option<String>, mode: SyncMode) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.remote.url = url;
        config.remote.request_timeout_secs = 2;
        config.mode = mode;
        config
    }

    fn settings(poll_ms: u64) -> AgentSettings {
        AgentSettings {
            poll_interval: Duration::from_millis(poll_ms),
            push_on_change: true,
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        for _ in 0..250 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        cond()
    }

    #[tokio::test]
    async fn test_disabled_agent_does_not_start() {
        let store = local_store().await;

        let no_remote = config(None, SyncMode::PullPush);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &no_remote).unwrap());
        assert!(SyncAgent::spawn(adapter, store.clone(), &no_remote).is_none());

        let offline = config(Some("http://127.0.0.1:9".into()), SyncMode::Offline);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &offline).unwrap());
        assert!(SyncAgent::spawn(adapter, store.clone(), &offline).is_none());
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_pulls_immediately_on_start() {
        let server = remote(vec![product("R1")]).await;
        let store = local_store().await;
        let cfg = config(Some(server.url()), SyncMode::PullPush);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &cfg).unwrap());

        // The poll interval is far longer than the test.
        let agent = SyncAgent::spawn_with(adapter, store.clone(), settings(60_000));

        assert!(wait_until(|| store.products().len() == 1).await);
        assert_eq!(store.products()[0].id, "R1");

        agent.shutdown().await;
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_local_change_is_pushed_and_remote_change_is_not() {
        let server = remote(Vec::new()).await;
        let store = local_store().await;
        let cfg = config(Some(server.url()), SyncMode::PullPush);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &cfg).unwrap());

        let agent = SyncAgent::spawn_with(adapter.clone(), store.clone(), settings(60_000));

        // The initial pull empties the local catalog without pushing.
        assert!(wait_until(|| adapter.status().pulls_succeeded == 1).await);
        assert!(store.products().is_empty());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(adapter.status().pushes_succeeded, 0);

        store.add_product(product("L1")).await.unwrap();
        assert!(wait_until(|| adapter.status().pushes_succeeded == 1).await);

        let client = CatalogClient::new(&server.url(), Duration::from_secs(2), "test-node").unwrap();
        let remote_ids: Vec<_> = client
            .fetch_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(remote_ids, vec!["L1"]);

        agent.shutdown().await;
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_ledger_reset_does_not_push() {
        let server = remote(Vec::new()).await;
        let store = local_store().await;
        let cfg = config(Some(server.url()), SyncMode::PullPush);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &cfg).unwrap());

        let agent = SyncAgent::spawn_with(adapter.clone(), store.clone(), settings(60_000));
        assert!(wait_until(|| adapter.status().pulls_succeeded == 1).await);

        store.reset_sales().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(adapter.status().pushes_succeeded, 0);

        agent.shutdown().await;
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_pull_only_subscribes_nothing() {
        let server = remote(vec![product("R1")]).await;
        let store = local_store().await;
        let cfg = config(Some(server.url()), SyncMode::PullOnly);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &cfg).unwrap());

        let agent = SyncAgent::spawn(adapter.clone(), store.clone(), &cfg).unwrap();
        assert_eq!(store.subscriber_count(), 0);
        assert!(wait_until(|| adapter.status().pulls_succeeded == 1).await);

        agent.shutdown().await;
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_polls_repeatedly_and_survives_failures() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let store = local_store().await;
        let before = store.products();
        let cfg = config(Some(dead), SyncMode::PullPush);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &cfg).unwrap());

        let agent = SyncAgent::spawn_with(adapter.clone(), store.clone(), settings(30));
        assert!(wait_until(|| adapter.status().pulls_failed >= 3).await);
        assert!(!agent.is_finished());
        assert_eq!(store.products(), before);

        agent.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes() {
        let server = remote(Vec::new()).await;
        let store = local_store().await;
        let cfg = config(Some(server.url()), SyncMode::PullPush);
        let adapter = Arc::new(RemoteSyncAdapter::new(store.clone(), &cfg).unwrap());

        let agent = SyncAgent::spawn_with(adapter, store.clone(), settings(60_000));
        assert_eq!(store.subscriber_count(), 1);

        agent.shutdown().await;
        assert_eq!(store.subscriber_count(), 0);
        server.shutdown().await;
    }
}
