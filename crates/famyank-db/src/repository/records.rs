//! # State Record Repository
//!
//! Each logical record (catalog, ledger, accounts) is one JSON document
//! under a fixed key. A save rewrites whole documents; several documents
//! saved together commit or roll back as one.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Record Keys
// =============================================================================

/// The fixed keys the store persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Products,
    Sales,
    Users,
}

impl RecordKey {
    pub const ALL: [RecordKey; 3] = [RecordKey::Products, RecordKey::Sales, RecordKey::Users];

    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordKey::Products => "famyank_products",
            RecordKey::Sales => "famyank_sales",
            RecordKey::Users => "famyank_users",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub key: RecordKey,
    pub value: String,
}

impl StateRecord {
    pub fn new(key: RecordKey, value: impl Into<String>) -> Self {
        StateRecord {
            key,
            value: value.into(),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the `state_records` table.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecordRepository { pool }
    }

    /// Loads one document, `None` if it was never written.
    pub async fn load(&self, key: RecordKey) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM state_records WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
            None => Ok(None),
        }
    }

    /// Writes every record in a single transaction.
    ///
    /// ## Atomicity
    /// ```text
    /// BEGIN
    ///   UPSERT famyank_products
    ///   UPSERT famyank_sales
    /// COMMIT   ← both visible, or (on any error) neither
    /// ```
    pub async fn save_all(&self, records: &[StateRecord]) -> DbResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO state_records (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(record.key.as_str())
            .bind(&record.value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = records.len(), "State records saved");
        Ok(())
    }

    /// Keys present in the table, known or not.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM state_records ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
