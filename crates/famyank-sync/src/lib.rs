//! # famyank-sync: Remote Catalog Sync for Famyank POS
//!
//! Keeps a local [`PosStore`](famyank_store::PosStore) catalog in step with
//! a shared HTTP catalog, and provides the server side of that catalog.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sync Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  SyncAgent (tokio task)                                          │   │
//! │  │    interval ─► pull      local change event ─► push              │   │
//! │  └────────────────────────────┬─────────────────────────────────────┘   │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │  RemoteSyncAdapter                                               │   │
//! │  │    pull_remote() ─► replace_catalog(.., Remote)                  │   │
//! │  │    push_local()  ─► best effort                                  │   │
//! │  │    every attempt ─► SyncOutcome ─► SyncObserver + SyncStatus     │   │
//! │  └────────────────────────────┬─────────────────────────────────────┘   │
//! │                               ▼                                         │
//! │  ┌────────────────┐   HTTP    ┌──────────────────────────────────────┐  │
//! │  │ CatalogClient  │ ────────► │ CatalogServer (axum)                 │  │
//! │  │ (reqwest)      │           │ GET/PUT /api/products, GET /health   │  │
//! │  └────────────────┘           └──────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`adapter`] - Pull/push with outcome reporting
//! - [`agent`] - Periodic pull and push-on-change loop
//! - [`client`] - HTTP client for the catalog endpoints
//! - [`config`] - Sync configuration (mode, node id, remote URL)
//! - [`error`] - Sync error types
//! - [`server`] - The catalog HTTP server
//! - [`wire`] - Request and response bodies

pub mod adapter;
pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod wire;

pub use adapter::{
    NoOpObserver, OutcomeStatus, RemoteSyncAdapter, SyncDirection, SyncObserver, SyncOutcome,
    SyncStatus, TracingObserver,
};
pub use agent::{AgentSettings, SyncAgent, SyncAgentHandle};
pub use client::CatalogClient;
pub use config::{SyncConfig, SyncMode};
pub use error::{SyncError, SyncResult};
pub use server::{ApiError, CatalogServer, CatalogServerHandle, DEFAULT_SERVER_PORT};
