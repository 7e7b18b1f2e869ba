//! # famyank-db: Database Layer for Famyank POS
//!
//! Durable storage for the store's three state records. Each record is a
//! JSON document kept under a fixed key in one SQLite table.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Famyank POS Data Flow                             │
//! │                                                                         │
//! │  PosStore::execute_sale(cart, staff)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    famyank-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │ StateBackend  │    │  Repository    │    │  Migrations  │  │   │
//! │  │   │ (backend.rs)  │───►│ (records.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │                │    │              │  │   │
//! │  │   │ Database      │    │ load(key)      │    │ 001_state_   │  │   │
//! │  │   │ MemoryBackend │    │ save_all(..)   │    │ records.sql  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  state_records: famyank_products | famyank_sales | famyank_users│   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The state record repository
//! - [`backend`] - The storage seam used by the store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use famyank_db::{Database, DbConfig, RecordKey, StateBackend};
//!
//! let db = Database::new(DbConfig::new("famyank.db")).await?;
//! let products = db.load(RecordKey::Products).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{MemoryBackend, StateBackend};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::records::{RecordKey, RecordRepository, StateRecord};
