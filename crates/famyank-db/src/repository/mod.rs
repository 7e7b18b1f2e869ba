//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PosStore (via StateBackend)                                           │
//! │       │                                                                 │
//! │       │  db.records().save_all([products, sales])                      │
//! │       ▼                                                                 │
//! │  RecordRepository                                                      │
//! │  ├── load(&self, key)                                                  │
//! │  ├── save_all(&self, records)   ← one transaction                      │
//! │  └── keys(&self)                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: state_records                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`records::RecordRepository`] - Keyed JSON state documents

pub mod records;
