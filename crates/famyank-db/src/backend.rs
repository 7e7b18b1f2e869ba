//! # State Backends
//!
//! The seam between the store and its storage. The store only needs to load
//! a document by key and to write several documents atomically.
//!
//! ```text
//!            ┌──────────────────────┐
//!  PosStore ─►  dyn StateBackend    │
//!            └──────┬───────┬───────┘
//!                   │       │
//!          ┌────────▼──┐ ┌──▼──────────────┐
//!          │ Database  │ │ MemoryBackend   │
//!          │ (SQLite)  │ │ (tests, demos)  │
//!          └───────────┘ └─────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::records::{RecordKey, StateRecord};

/// Persistent storage for the store's state records.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Loads one document, `None` if never written.
    async fn load(&self, key: RecordKey) -> DbResult<Option<String>>;

    /// Writes all records atomically: every record lands or none does.
    async fn save(&self, records: Vec<StateRecord>) -> DbResult<()>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl StateBackend for Database {
    async fn load(&self, key: RecordKey) -> DbResult<Option<String>> {
        self.records().load(key).await
    }

    async fn save(&self, records: Vec<StateRecord>) -> DbResult<()> {
        self.records().save_all(&records).await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// =============================================================================
// Memory Backend
// =============================================================================

/// A process-local backend.
///
/// Writes can be switched off to exercise storage-failure paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<RecordKey, String>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the given documents already present.
    pub fn with_records(records: impl IntoIterator<Item = (RecordKey, String)>) -> Self {
        MemoryBackend {
            records: Mutex::new(records.into_iter().collect()),
            ..Self::default()
        }
    }

    /// When set, every `save` fails with `DbError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current document under `key`.
    pub async fn raw(&self, key: RecordKey) -> Option<String> {
        self.records.lock().await.get(&key).cloned()
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn load(&self, key: RecordKey) -> DbResult<Option<String>> {
        Ok(self.records.lock().await.get(&key).cloned())
    }

    async fn save(&self, records: Vec<StateRecord>) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("writes disabled".to_string()));
        }
        let mut stored = self.records.lock().await;
        for record in records {
            stored.insert(record.key, record.value);
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
