//! # famyank-core: Pure Business Logic for Famyank POS
//!
//! Everything here is deterministic and free of I/O. The store service
//! feeds it snapshots and commits what it returns.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Famyank POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Web UI / pos-node / catalog-server                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        famyank-store (PosStore)      famyank-sync (adapter)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ famyank-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │  │  money  │ │ currency │ │ checkout │ │ reports │ │  seed  │  │   │
//! │  │  │  Money  │ │ GHS/USD  │ │ plan_sale│ │ summary │ │ catalog│  │   │
//! │  │  │ TaxRate │ │ rounding │ │          │ │ receipt │ │ users  │  │   │
//! │  │  └─────────┘ └──────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Sale, CartLine, staff accounts
//! - [`money`] - Integer money and tax rates
//! - [`currency`] - GHS/USD conversion and decimal rounding
//! - [`checkout`] - Validate-then-commit sale planning
//! - [`reports`] - Dashboard and receipt figures
//! - [`validation`] - Input rules
//! - [`ids`] - Monotonic id generation
//! - [`seed`] - Default catalog and staff
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod currency;
pub mod error;
pub mod ids;
pub mod money;
pub mod reports;
pub mod seed;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{plan_sale, SalePlan};
pub use currency::Currency;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single cart line.
///
/// Catches typing 1000 instead of 10 at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest unit price or cost a product may carry, in minor units.
///
/// A full cart at this price stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Largest stock level a product may carry.
pub const MAX_STOCK: i64 = 1_000_000_000;
