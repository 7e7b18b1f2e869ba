//! # Change Notification Bus
//!
//! Tells subscribers that catalog, ledger or account state changed.
//!
//! ## Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PosStore::execute_sale                                                │
//! │     │  persist ──► swap snapshot                                       │
//! │     ▼                                                                   │
//! │  bus.notify(SaleRecorded)            same thread, registration order   │
//! │     ├──► handler #1  (UI refresh)                                      │
//! │     ├──► handler #2  panics ──► caught, logged, delivery continues     │
//! │     └──► handler #3  (sync agent: try_send into its channel)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers run synchronously and must not block. A handler that needs to do
//! I/O should hand the event to a channel, as the sync agent does.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

// =============================================================================
// Events
// =============================================================================

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    ProductAdded { product_id: String },
    ProductUpdated { product_id: String },
    /// The catalog was reset to the seed products.
    CatalogRestored,
    /// The catalog was replaced wholesale (sync pull or bulk import).
    CatalogReplaced { count: usize },
    SaleRecorded { sale_id: String },
    SalesReset,
    AccountsChanged,
}

impl ChangeKind {
    /// Whether the product list (including stock levels) changed.
    pub fn affects_catalog(&self) -> bool {
        matches!(
            self,
            ChangeKind::ProductAdded { .. }
                | ChangeKind::ProductUpdated { .. }
                | ChangeKind::CatalogRestored
                | ChangeKind::CatalogReplaced { .. }
                | ChangeKind::SaleRecorded { .. }
        )
    }
}

/// Where the change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// An operation on this store.
    #[default]
    Local,
    /// State received from the remote catalog.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub origin: ChangeOrigin,
}

impl ChangeEvent {
    pub fn local(kind: ChangeKind) -> Self {
        ChangeEvent {
            kind,
            origin: ChangeOrigin::Local,
        }
    }

    pub fn remote(kind: ChangeKind) -> Self {
        ChangeEvent {
            kind,
            origin: ChangeOrigin::Remote,
        }
    }
}

// =============================================================================
// Bus
// =============================================================================

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl Registry {
    fn remove(&self, id: u64) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        handlers.len() != before
    }
}

/// An ordered list of change handlers.
#[derive(Default)]
pub struct ChangeBus {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that only needs to know *that* something changed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_events(move |_| handler())
    }

    /// Registers a handler that receives the typed event.
    pub fn subscribe_events<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers `event` to every handler in registration order.
    ///
    /// Returns how many handlers completed without panicking.
    pub(crate) fn notify(&self, event: &ChangeEvent) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while being called.
        let handlers: Vec<(u64, Handler)> = self
            .registry
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut delivered = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(subscription = id, kind = ?event.kind, "Change handler panicked"),
            }
        }

        trace!(kind = ?event.kind, delivered, "Change delivered");
        delivered
    }
}

/// The capability to deregister one handler.
///
/// Dropping it leaves the handler registered.
#[must_use = "dropping a Subscription keeps the handler registered; call forget() to make that explicit"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes the handler. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }

    /// Keeps the handler for the bus's lifetime.
    pub fn forget(self) {}
}
