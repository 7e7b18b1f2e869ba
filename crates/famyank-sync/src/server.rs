//! # Catalog Server
//!
//! The HTTP catalog that POS nodes pull from and push to.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CatalogServer (Axum)                             │
//! │                                                                         │
//! │   GET  /api/products ──► read lock ──► [Product, ...]                   │
//! │                                                                         │
//! │   PUT  /api/products ──► validate ──► write lock ──► backend.save ──┐   │
//! │                             │                                       │   │
//! │                             ▼                                       ▼   │
//! │                    400 VALIDATION_ERROR                  { "count": n } │
//! │                                                                         │
//! │   GET  /health ──► "OK"                                                 │
//! │                                                                         │
//! │   Whole-catalog replace, last writer wins.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use famyank_core::validation::validate_catalog;
use famyank_core::Product;
use famyank_db::{RecordKey, StateBackend, StateRecord};
use famyank_store::ErrorCode;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::wire::{CountResponse, ErrorBody, ProductsPayload, NODE_HEADER};

/// Default port for the catalog server.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// =============================================================================
// Server State
// =============================================================================

struct ServerState {
    backend: Arc<dyn StateBackend>,
    products: RwLock<Vec<Product>>,
}

impl ServerState {
    async fn replace(&self, products: Vec<Product>) -> SyncResult<usize> {
        validate_catalog(&products)?;
        let encoded = serde_json::to_string(&products)?;

        let mut current = self.products.write().await;
        self.backend
            .save(vec![StateRecord::new(RecordKey::Products, encoded)])
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to persist remote catalog");
                SyncError::Storage(e)
            })?;

        let count = products.len();
        *current = products;
        Ok(count)
    }
}

// =============================================================================
// Catalog Server
// =============================================================================

pub struct CatalogServer {
    state: Arc<ServerState>,
}

/// Handle for a running server.
pub struct CatalogServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CatalogServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL clients should use.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stops accepting requests and waits for in-flight ones.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Catalog server task ended abnormally");
        }
    }
}

impl CatalogServer {
    /// Loads the persisted catalog, or starts empty.
    pub async fn open(backend: Arc<dyn StateBackend>) -> SyncResult<Self> {
        let products: Vec<Product> = match backend.load(RecordKey::Products).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| SyncError::CorruptRecord(e.to_string()))?,
            None => Vec::new(),
        };

        info!(
            backend = backend.name(),
            count = products.len(),
            "Catalog server state loaded"
        );

        Ok(CatalogServer {
            state: Arc::new(ServerState {
                backend,
                products: RwLock::new(products),
            }),
        })
    }

    pub async fn products(&self) -> Vec<Product> {
        self.state.products.read().await.clone()
    }

    /// Same as a `PUT /api/products`.
    pub async fn replace(&self, products: Vec<Product>) -> SyncResult<usize> {
        self.state.replace(products).await
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/products", get(get_products).put(put_products))
            .route("/health", get(health_handler))
            .with_state(self.state.clone())
    }

    /// Binds `bind_addr` and serves until the handle is shut down.
    pub async fn start(self, bind_addr: &str) -> SyncResult<CatalogServerHandle> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let app = self.router();

        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| SyncError::Bind {
                addr: bind_addr.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "Catalog server started");

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await;
                    info!("Catalog server shutting down");
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "Catalog server stopped with error");
            }
        });

        Ok(CatalogServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn get_products(State(state): State<Arc<ServerState>>) -> Json<Vec<Product>> {
    Json(state.products.read().await.clone())
}

async fn put_products(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    payload: Result<Json<ProductsPayload>, JsonRejection>,
) -> Result<Json<CountResponse>, ApiError> {
    let node = headers
        .get(NODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let Json(payload) = payload.map_err(|e| SyncError::BadRequest(e.body_text()))?;

    match state.replace(payload.products).await {
        Ok(count) => {
            info!(%node, count, "Remote catalog replaced");
            Ok(Json(CountResponse { count }))
        }
        Err(e) => {
            warn!(%node, error = %e, "Catalog upload rejected");
            Err(e.into())
        }
    }
}

// =============================================================================
// Error Responses
// =============================================================================

/// A failure rendered as `{ "code", "message" }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let (status, code) = match &err {
            SyncError::InvalidCatalog(_) | SyncError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ValidationError)
            }
            SyncError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::StorageError),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal),
        };
        ApiError {
            status,
            body: ErrorBody {
                code,
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use famyank_core::seed::default_products;
    use famyank_db::MemoryBackend;
    use serde_json::json;

    async fn running(backend: Arc<MemoryBackend>) -> CatalogServerHandle {
        CatalogServer::open(backend)
            .await
            .unwrap()
            .start("127.0.0.1:0")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_starts_empty_and_serves_health() {
        let handle = running(Arc::new(MemoryBackend::new())).await;
        let http = reqwest::Client::new();

        let health = http.get(format!("{}/health", handle.url())).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "OK");

        let products: Vec<Product> = http
            .get(format!("{}/api/products", handle.url()))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(products.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_put_replaces_and_persists() {
        let backend = Arc::new(MemoryBackend::new());
        let handle = running(backend.clone()).await;

        let response = reqwest::Client::new()
            .put(format!("{}/api/products", handle.url()))
            .json(&json!({ "products": default_products() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: CountResponse = response.json().await.unwrap();
        assert_eq!(body.count, 4);

        let raw = backend.raw(RecordKey::Products).await.unwrap();
        let stored: Vec<Product> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, default_products());
        handle.shutdown().await;

        // A restarted server picks the catalog back up.
        let reopened = CatalogServer::open(backend).await.unwrap();
        assert_eq!(reopened.products().await, default_products());
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let handle = running(backend.clone()).await;

        let mut products = default_products();
        products[1].id = products[0].id.clone();

        let response = reqwest::Client::new()
            .put(format!("{}/api/products", handle.url()))
            .json(&json!({ "products": products }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.code, ErrorCode::ValidationError);
        assert!(backend.raw(RecordKey::Products).await.is_none());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let handle = running(Arc::new(MemoryBackend::new())).await;

        let response = reqwest::Client::new()
            .put(format!("{}/api/products", handle.url()))
            .json(&json!({ "items": [] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.code, ErrorCode::ValidationError);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_previous_catalog() {
        let backend = Arc::new(MemoryBackend::new());
        let server = CatalogServer::open(backend.clone()).await.unwrap();
        server.replace(default_products()).await.unwrap();

        backend.set_fail_writes(true);
        let err = server.replace(Vec::new()).await.unwrap_err();
        assert!(matches!(err, SyncError::Storage(_)));
        assert_eq!(server.products().await.len(), 4);

        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.code, ErrorCode::StorageError);
    }

    #[tokio::test]
    async fn test_corrupt_record_fails_open() {
        let backend = Arc::new(MemoryBackend::with_records([(
            RecordKey::Products,
            "{not json".to_string(),
        )]));
        assert!(matches!(
            CatalogServer::open(backend).await,
            Err(SyncError::CorruptRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_failure_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let server = CatalogServer::open(Arc::new(MemoryBackend::new())).await.unwrap();
        assert!(matches!(server.start(&addr).await, Err(SyncError::Bind { .. })));
    }
}
