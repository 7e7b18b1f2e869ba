//! # famyank-store: The PosStore Service
//!
//! One explicitly constructed store per process (or per test), shared by
//! handle. It owns the catalog, the sale ledger and the staff accounts, and
//! is the only thing that writes them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   UI / pos-node          RemoteSyncAdapter (famyank-sync)              │
//! │        │                        │ replace_catalog(.., Remote)          │
//! │        ▼                        ▼                                      │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 famyank-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  PosStore ── writer gate ── Catalog / SaleLedger / accounts     │   │
//! │  │     │                                                           │   │
//! │  │     ├── plan_sale (famyank-core)                               │   │
//! │  │     ├── StateBackend::save (famyank-db)                        │   │
//! │  │     └── ChangeBus::notify ──► subscribers                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use famyank_store::{PosStore, StoreConfig};
//!
//! let store = Arc::new(PosStore::open(Arc::new(db), StoreConfig::load_or_default(None)).await?);
//! let _sub = store.subscribe(|| println!("changed"));
//! let sale = store.execute_sale(&cart, &session.staff_ref()).await?;
//! ```

pub mod accounts;
pub mod bus;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod store;

pub use bus::{ChangeBus, ChangeEvent, ChangeKind, ChangeOrigin, Subscription};
pub use catalog::Catalog;
pub use config::StoreConfig;
pub use dashboard::Dashboard;
pub use error::{ErrorCode, StoreError, StoreResult};
pub use ledger::SaleLedger;
pub use store::PosStore;
