//! # PosStore
//!
//! The injectable store service: catalog, sale ledger, staff accounts and
//! the change bus behind one writer gate.
//!
//! ## Mutation Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  writer.lock().await          one mutation at a time, across awaits    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clone snapshot ──► apply (pure) ──► Err? return, nothing changed      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  backend.save([records])      one transaction; Err? nothing changed    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  swap snapshot                readers now see the new state            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bus.notify(event)            exactly once, gate still held            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads never wait for the gate. They clone from the last swapped snapshot,
//! so a reader sees either the state before a sale or after it, never stock
//! decremented without the sale present.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use famyank_core::ids::{IdGenerator, PRODUCT_PREFIX, SALE_PREFIX, USER_PREFIX};
use famyank_core::reports::Receipt;
use famyank_core::seed::seed_users;
use famyank_core::{plan_sale, CartLine, CoreError, Product, Sale, StaffRef, UserAccount};
use famyank_db::{RecordKey, StateBackend, StateRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::accounts;
use crate::bus::{ChangeBus, ChangeEvent, ChangeKind, ChangeOrigin, Subscription};
use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::ledger::SaleLedger;

/// Everything the store owns, swapped as a unit.
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    pub(crate) catalog: Catalog,
    pub(crate) ledger: SaleLedger,
    pub(crate) users: Vec<UserAccount>,
}

/// The point-of-sale store.
///
/// Construct once with [`PosStore::open`] and share as `Arc<PosStore>`.
pub struct PosStore {
    backend: Arc<dyn StateBackend>,
    state: RwLock<StoreState>,
    writer: Mutex<()>,
    catalog_generation: AtomicU64,
    ids: IdGenerator,
    bus: ChangeBus,
    config: StoreConfig,
}

impl std::fmt::Debug for PosStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosStore")
            .field("backend", &self.backend.name())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

pub(crate) fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn encode<T: Serialize>(key: RecordKey, value: &T) -> StoreResult<StateRecord> {
    Ok(StateRecord::new(key, serde_json::to_string(value)?))
}

fn decode<T: DeserializeOwned>(key: RecordKey, raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|source| StoreError::CorruptRecord { key, source })
}

impl PosStore {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Loads the three records from `backend`, seeding absent ones when
    /// `config.seed_defaults` is set.
    ///
    /// ## Bootstrap
    /// ```text
    /// famyank_products  absent → 4 default products
    /// famyank_sales     absent → []
    /// famyank_users     absent → u1 (admin), u2 (worker)
    /// ```
    /// Seeded records are written back in one transaction. The id generator
    /// is advanced past every persisted id.
    pub async fn open(backend: Arc<dyn StateBackend>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let mut seeded = Vec::new();

        let catalog = match backend.load(RecordKey::Products).await? {
            Some(raw) => decode(RecordKey::Products, &raw)?,
            None if config.seed_defaults => {
                let catalog = Catalog::defaults();
                seeded.push(encode(RecordKey::Products, &catalog)?);
                catalog
            }
            None => Catalog::default(),
        };

        let ledger = match backend.load(RecordKey::Sales).await? {
            Some(raw) => decode(RecordKey::Sales, &raw)?,
            None => {
                let ledger = SaleLedger::default();
                if config.seed_defaults {
                    seeded.push(encode(RecordKey::Sales, &ledger)?);
                }
                ledger
            }
        };

        let users: Vec<UserAccount> = match backend.load(RecordKey::Users).await? {
            Some(raw) => decode(RecordKey::Users, &raw)?,
            None if config.seed_defaults => {
                let mut users = seed_users();
                if let Some(password) = &config.bootstrap_admin_password {
                    accounts::attach_admin_password(&mut users, password)?;
                }
                seeded.push(encode(RecordKey::Users, &users)?);
                users
            }
            None => Vec::new(),
        };

        let ids = IdGenerator::new();
        for product in catalog.products() {
            ids.observe(PRODUCT_PREFIX, &product.id);
        }
        for sale in ledger.sales() {
            ids.observe(SALE_PREFIX, &sale.id);
        }
        for user in &users {
            ids.observe(USER_PREFIX, &user.id);
        }

        if seeded.is_empty() {
            info!(
                backend = backend.name(),
                products = catalog.len(),
                sales = ledger.len(),
                users = users.len(),
                "Store loaded"
            );
        } else {
            let count = seeded.len();
            backend.save(seeded).await?;
            info!(
                backend = backend.name(),
                records = count,
                products = catalog.len(),
                "Store seeded with defaults"
            );
        }

        Ok(PosStore {
            backend,
            state: RwLock::new(StoreState {
                catalog,
                ledger,
                users,
            }),
            writer: Mutex::new(()),
            catalog_generation: AtomicU64::new(0),
            ids,
            bus: ChangeBus::new(),
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) async fn gate(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    pub(crate) fn next_id(&self, prefix: &str) -> String {
        self.ids.next_id(prefix, now_ms())
    }

    /// Persists `records` in one backend transaction.
    pub(crate) async fn persist(&self, records: Vec<StateRecord>) -> StoreResult<()> {
        self.backend.save(records).await.map_err(|e| {
            error!(backend = self.backend.name(), error = %e, "Failed to persist state");
            StoreError::Storage(e)
        })
    }

    /// Makes new state visible and notifies. Caller holds the gate.
    pub(crate) fn commit(&self, apply: impl FnOnce(&mut StoreState), event: ChangeEvent) {
        {
            let mut state = self.write();
            apply(&mut state);
            if event.kind.affects_catalog() {
                self.catalog_generation.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.bus.notify(&event);
    }

    pub(crate) fn encode_users(users: &[UserAccount]) -> StoreResult<StateRecord> {
        encode(RecordKey::Users, &users)
    }

    async fn commit_catalog(&self, catalog: Catalog, event: ChangeEvent) -> StoreResult<()> {
        self.persist(vec![encode(RecordKey::Products, &catalog)?]).await?;
        self.commit(|state| state.catalog = catalog, event);
        Ok(())
    }

    // =========================================================================
    // Change Notification
    // =========================================================================

    /// Registers a zero-argument change handler.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Registers a handler that receives the typed [`ChangeEvent`].
    pub fn subscribe_events<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe_events(handler)
    }

    /// Handlers currently registered.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// A copy of the catalog in insertion order.
    pub fn products(&self) -> Vec<Product> {
        self.read().catalog.products().to_vec()
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.read().catalog.get(id).cloned()
    }

    /// Bumped by every committed catalog change, stock decrements included.
    ///
    /// Capture it before slow work whose result will replace the catalog and
    /// hand it to [`PosStore::replace_catalog_if_unchanged`].
    pub fn catalog_generation(&self) -> u64 {
        self.catalog_generation.load(Ordering::SeqCst)
    }

    /// A fresh id for a product about to be created.
    pub fn next_product_id(&self) -> String {
        self.next_id(PRODUCT_PREFIX)
    }

    pub async fn add_product(&self, product: Product) -> StoreResult<Product> {
        let _gate = self.gate().await;

        let mut catalog = self.read().catalog.clone();
        catalog.add(product.clone())?;
        self.ids.observe(PRODUCT_PREFIX, &product.id);

        self.commit_catalog(
            catalog,
            ChangeEvent::local(ChangeKind::ProductAdded {
                product_id: product.id.clone(),
            }),
        )
        .await?;

        info!(product_id = %product.id, sku = %product.sku, "Product added");
        Ok(product)
    }

    pub async fn update_product(&self, product: Product) -> StoreResult<Product> {
        let _gate = self.gate().await;

        let mut catalog = self.read().catalog.clone();
        catalog.update(product.clone())?;

        self.commit_catalog(
            catalog,
            ChangeEvent::local(ChangeKind::ProductUpdated {
                product_id: product.id.clone(),
            }),
        )
        .await?;

        info!(product_id = %product.id, stock = product.stock, "Product updated");
        Ok(product)
    }

    /// Replaces the catalog with the seed products.
    pub async fn restore_defaults(&self) -> StoreResult<()> {
        let _gate = self.gate().await;

        self.commit_catalog(
            Catalog::defaults(),
            ChangeEvent::local(ChangeKind::CatalogRestored),
        )
        .await?;

        info!("Catalog restored to defaults");
        Ok(())
    }

    /// Replaces the catalog wholesale. Returns the new product count.
    pub async fn replace_catalog(
        &self,
        products: Vec<Product>,
        origin: ChangeOrigin,
    ) -> StoreResult<usize> {
        let _gate = self.gate().await;
        self.replace_catalog_locked(products, origin).await
    }

    /// Replaces the catalog only if no catalog change committed since
    /// `generation` was read. `Ok(None)` means the replacement was stale and
    /// nothing changed.
    pub async fn replace_catalog_if_unchanged(
        &self,
        products: Vec<Product>,
        origin: ChangeOrigin,
        generation: u64,
    ) -> StoreResult<Option<usize>> {
        let _gate = self.gate().await;

        let current = self.catalog_generation();
        if current != generation {
            info!(
                expected = generation,
                current,
                ?origin,
                "Catalog replacement dropped, catalog changed meanwhile"
            );
            return Ok(None);
        }
        self.replace_catalog_locked(products, origin).await.map(Some)
    }

    async fn replace_catalog_locked(
        &self,
        products: Vec<Product>,
        origin: ChangeOrigin,
    ) -> StoreResult<usize> {
        let catalog = Catalog::checked(products)?;
        let count = catalog.len();
        for product in catalog.products() {
            self.ids.observe(PRODUCT_PREFIX, &product.id);
        }

        self.commit_catalog(
            catalog,
            ChangeEvent {
                kind: ChangeKind::CatalogReplaced { count },
                origin,
            },
        )
        .await?;

        info!(count, ?origin, "Catalog replaced");
        Ok(count)
    }

    // =========================================================================
    // Sale Ledger
    // =========================================================================

    /// A copy of the ledger, oldest first.
    pub fn sales(&self) -> Vec<Sale> {
        self.read().ledger.sales().to_vec()
    }

    pub fn sale(&self, id: &str) -> Option<Sale> {
        self.read().ledger.get(id).cloned()
    }

    /// Clears the ledger. The catalog is untouched.
    pub async fn reset_sales(&self) -> StoreResult<()> {
        let _gate = self.gate().await;

        let mut ledger = self.read().ledger.clone();
        let cleared = ledger.len();
        ledger.reset();
        self.persist(vec![encode(RecordKey::Sales, &ledger)?]).await?;
        self.commit(
            |state| state.ledger = ledger,
            ChangeEvent::local(ChangeKind::SalesReset),
        );

        info!(cleared, "Sales ledger reset");
        Ok(())
    }

    /// A printable receipt for a committed sale at the configured tax rate.
    pub fn receipt(&self, sale_id: &str) -> StoreResult<Receipt> {
        let state = self.read();
        let sale = state
            .ledger
            .get(sale_id)
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        Ok(Receipt::new(sale, self.config.tax_rate()))
    }

    // =========================================================================
    // Sale Execution
    // =========================================================================

    /// Sells `cart` as one all-or-nothing unit.
    ///
    /// Stock is checked against the catalog as it is now, not as the caller
    /// last saw it. On any failure the catalog and ledger are unchanged and
    /// nothing is notified.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let sale = store
    ///     .execute_sale(&[CartLine::new("A", 3)], &StaffRef::new("u1", "Admin Francisca"))
    ///     .await?;
    /// assert_eq!(sale.total_amount_cents, 13_500);
    /// ```
    pub async fn execute_sale(&self, cart: &[CartLine], staff: &StaffRef) -> StoreResult<Sale> {
        let _gate = self.gate().await;

        let (catalog, mut ledger) = {
            let state = self.read();
            (state.catalog.clone(), state.ledger.clone())
        };

        let now = now_ms();
        let timestamp = DateTime::from_timestamp_millis(now as i64).unwrap_or_else(Utc::now);
        let sale_id = self.ids.next_id(SALE_PREFIX, now);

        let plan = plan_sale(catalog.products(), cart, staff, sale_id, timestamp).map_err(|e| {
            warn!(
                product_id = e.product_id().unwrap_or("-"),
                staff_id = %staff.id,
                error = %e,
                "Sale rejected"
            );
            e
        })?;

        let sale = plan.sale;
        let catalog = Catalog::new(plan.products);
        ledger.append(sale.clone());

        self.persist(vec![
            encode(RecordKey::Products, &catalog)?,
            encode(RecordKey::Sales, &ledger)?,
        ])
        .await?;

        self.commit(
            |state| {
                state.catalog = catalog;
                state.ledger = ledger;
            },
            ChangeEvent::local(ChangeKind::SaleRecorded {
                sale_id: sale.id.clone(),
            }),
        );

        info!(
            sale_id = %sale.id,
            staff_id = %staff.id,
            lines = sale.items.len(),
            total_cents = sale.total_amount_cents,
            profit_cents = sale.total_profit_cents,
            "Sale committed"
        );
        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
