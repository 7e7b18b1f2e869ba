//! # Domain Types
//!
//! Core domain types for Famyank POS.
//!
//! ## Entity Relationship
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌─────────────────┐        ┌─────────────────┐                        │
//! │  │    Product      │        │      Sale       │                        │
//! │  │  ─────────────  │        │  ─────────────  │                        │
//! │  │  id, sku        │◄───────│  items[]        │                        │
//! │  │  price, cost    │ copied │  total_amount   │                        │
//! │  │  stock          │  into  │  total_profit   │                        │
//! │  └─────────────────┘        │  staff id/name  │                        │
//! │          ▲                  └─────────────────┘                        │
//! │          │ product_id                ▲                                  │
//! │  ┌───────┴─────────┐        ┌────────┴────────┐                        │
//! │  │    CartLine     │        │   SessionUser   │                        │
//! │  │  (intent only)  │        │  → StaffRef     │                        │
//! │  └─────────────────┘        └─────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names serialize in camelCase; these are the shapes stored in the
//! state records and exchanged with the catalog server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::{convert, Currency};
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog entry. Prices are in the store currency (GHS) minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Opaque id, stable for the product's lifetime.
    pub id: String,

    /// Human-facing stock keeping unit.
    pub sku: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Category label (Apparel, Footwear, ...).
    #[serde(default)]
    pub category: String,

    /// Unit selling price in pesewas.
    pub price_cents: i64,

    /// Unit cost in pesewas.
    pub cost_cents: i64,

    /// On-hand units. Never negative after a committed sale.
    pub stock: i64,

    /// Image URL or data reference.
    #[serde(default)]
    pub image: String,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Profit on one unit at the current price and cost.
    #[inline]
    pub fn unit_margin(&self) -> Money {
        self.price() - self.cost()
    }

    /// Selling price expressed in another currency.
    pub fn price_in(&self, currency: Currency) -> Money {
        convert(self.price(), Currency::Ghs, currency)
    }

    pub fn cost_in(&self, currency: Currency) -> Money {
        convert(self.cost(), Currency::Ghs, currency)
    }

    /// True when stock is strictly below `threshold`.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock < threshold
    }
}

// =============================================================================
// Cart & Staff
// =============================================================================

/// One proposed checkout line: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// The staff member credited with a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StaffRef {
    pub id: String,
    pub name: String,
}

impl StaffRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        StaffRef {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a committed sale. Price and cost are copies taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub product_id: String,

    /// Product name at the time of sale, for receipts.
    pub name: String,

    pub quantity: i64,

    pub unit_price_cents: i64,

    pub unit_cost_cents: i64,

    /// `unit_price_cents × quantity`.
    pub total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// `(unit price − unit cost) × quantity`.
    pub fn profit(&self) -> Money {
        (Money::from_cents(self.unit_price_cents) - Money::from_cents(self.unit_cost_cents))
            .multiply_quantity(self.quantity)
    }
}

/// An immutable record of one completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    /// `SALE-<n>`, strictly increasing in commit order.
    pub id: String,

    /// Commit time, serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,

    pub items: Vec<SaleItem>,

    pub total_amount_cents: i64,

    pub total_profit_cents: i64,

    pub staff_id: String,

    pub staff_name: String,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn total_profit(&self) -> Money {
        Money::from_cents(self.total_profit_cents)
    }

    /// Checks that the aggregates equal the sums over the lines.
    pub fn is_consistent(&self) -> bool {
        let amount: Money = self.items.iter().map(SaleItem::total).sum();
        let profit: Money = self.items.iter().map(SaleItem::profit).sum();
        amount == self.total_amount() && profit == self.total_profit()
    }
}

// =============================================================================
// Staff Accounts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum UserRole {
    Admin,
    Worker,
    Client,
}

/// A persisted staff account.
///
/// `password_hash` is an Argon2 PHC string. `legacy_password` only exists on
/// records written before hashing was introduced and is replaced on the
/// first successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    #[serde(default, rename = "password", skip_serializing_if = "Option::is_none")]
    pub legacy_password: Option<String>,
}

impl UserAccount {
    /// Case-insensitive email comparison used for login and dedupe.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }

    /// The credential-free view handed to callers.
    pub fn session(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            name: self.name.clone(),
            role: self.role,
            email: self.email.clone(),
        }
    }
}

/// Session-safe user shape (no password fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub email: String,
}

impl SessionUser {
    /// The identity `execute_sale` credits.
    pub fn staff_ref(&self) -> StaffRef {
        StaffRef::new(self.id.clone(), self.name.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> Product {
        Product {
            id: "1".to_string(),
            sku: "FY-SH-001".to_string(),
            name: "Classic White Shirt".to_string(),
            description: String::new(),
            category: "Apparel".to_string(),
            price_cents: 54_000,
            cost_cents: 24_000,
            stock: 50,
            image: String::new(),
        }
    }

    #[test]
    fn test_product_money_accessors() {
        let p = shirt();
        assert_eq!(p.unit_margin().cents(), 30_000);
        assert_eq!(p.price_in(Currency::Usd).cents(), 4_500);
        assert_eq!(p.cost_in(Currency::Ghs).cents(), 24_000);
        assert!(!p.is_low_stock(10));
    }

    #[test]
    fn test_product_json_is_camel_case() {
        let json = serde_json::to_value(shirt()).unwrap();
        assert_eq!(json["priceCents"], 54_000);
        assert_eq!(json["costCents"], 24_000);

        // Optional descriptive fields may be absent on the wire.
        let minimal: Product = serde_json::from_str(
            r#"{"id":"9","sku":"X","name":"X","priceCents":1,"costCents":0,"stock":0}"#,
        )
        .unwrap();
        assert!(minimal.category.is_empty());
    }

    #[test]
    fn test_sale_timestamp_is_epoch_millis() {
        let sale = Sale {
            id: "SALE-1".to_string(),
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            items: vec![],
            total_amount_cents: 0,
            total_profit_cents: 0,
            staff_id: "u1".to_string(),
            staff_name: "Admin Francisca".to_string(),
        };
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123_i64);
        assert!(sale.is_consistent());
    }

    #[test]
    fn test_legacy_password_field_name() {
        let account: UserAccount = serde_json::from_str(
            r#"{"id":"u9","name":"Old","role":"WORKER","email":"old@famyank.com","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(account.legacy_password.as_deref(), Some("pw"));
        assert!(account.password_hash.is_none());
        assert!(account.email_matches(" OLD@famyank.com"));
        assert_eq!(account.session().staff_ref().name, "Old");
    }
}
