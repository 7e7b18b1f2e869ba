//! # Checkout Planning
//!
//! Turns a cart into a sale against a catalog snapshot, without touching the
//! snapshot. The caller commits the returned plan or discards it.
//!
//! ## Validate-then-commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cart lines ──► shape checks (non-empty, ≤100 lines, 1..=999 each)     │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  for each line:  exists? ── no ──► ProductNotFound      ┐              │
//! │                    │                                     │ nothing     │
//! │                    ▼                                     │ committed   │
//! │                  stock − already reserved ≥ qty? ── no ──► Insufficient│
//! │                    │                                     ┘              │
//! │                    ▼                                                    │
//! │                  reserve qty, capture price/cost                        │
//! │                    │                                                    │
//! │                    ▼ (all lines passed)                                 │
//! │  SalePlan { updated catalog copy, sale }                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines naming the same product are checked against the running total for
//! that product, so two lines of 3 against a stock of 5 fail on the second.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, Product, Sale, SaleItem, StaffRef};
use crate::validation::validate_cart_lines;
use crate::MAX_PRICE_CENTS;

/// The outcome of a successful plan: what the catalog and ledger become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    /// The full catalog with stock decremented for every sold line.
    pub products: Vec<Product>,

    /// The sale to append to the ledger.
    pub sale: Sale,
}

/// Plans a sale of `cart` against `catalog`.
///
/// ## Errors
/// - `EmptyCart` for no lines
/// - `Validation` for bad quantities or too many lines
/// - `ProductNotFound` / `InsufficientStock` naming the first failing line
/// - `Validation` when a line or sale total would overflow
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use famyank_core::checkout::plan_sale;
/// use famyank_core::types::{CartLine, Product, StaffRef};
///
/// let catalog = vec![Product {
///     id: "A".into(), sku: "A-1".into(), name: "A".into(),
///     description: String::new(), category: String::new(),
///     price_cents: 4_500, cost_cents: 2_000, stock: 10, image: String::new(),
/// }];
/// let plan = plan_sale(
///     &catalog,
///     &[CartLine::new("A", 3)],
///     &StaffRef::new("u1", "Admin"),
///     "SALE-1".into(),
///     Utc::now(),
/// ).unwrap();
///
/// assert_eq!(plan.products[0].stock, 7);
/// assert_eq!(plan.sale.total_amount_cents, 13_500);
/// assert_eq!(plan.sale.total_profit_cents, 7_500);
/// ```
pub fn plan_sale(
    catalog: &[Product],
    cart: &[CartLine],
    staff: &StaffRef,
    sale_id: String,
    timestamp: DateTime<Utc>,
) -> CoreResult<SalePlan> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    validate_cart_lines(cart)?;

    let index: HashMap<&str, usize> = catalog
        .iter()
        .enumerate()
        .rev()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    let mut reserved: HashMap<usize, i64> = HashMap::new();
    let mut items = Vec::with_capacity(cart.len());
    let mut total_amount = Money::zero();
    let mut total_profit = Money::zero();

    for line in cart {
        let idx = *index
            .get(line.product_id.as_str())
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        let product = &catalog[idx];

        let already = reserved.get(&idx).copied().unwrap_or(0);
        let available = product.stock - already;
        if available < line.quantity {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: available.max(0),
                requested: line.quantity,
            });
        }
        reserved.insert(idx, already + line.quantity);

        let line_total = product
            .price()
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| amount_overflow(product))?;
        let line_profit = product
            .price()
            .checked_sub(product.cost())
            .and_then(|margin| margin.checked_multiply_quantity(line.quantity))
            .ok_or_else(|| amount_overflow(product))?;
        total_amount = total_amount
            .checked_add(line_total)
            .ok_or_else(|| amount_overflow(product))?;
        total_profit = total_profit
            .checked_add(line_profit)
            .ok_or_else(|| amount_overflow(product))?;

        items.push(SaleItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: line.quantity,
            unit_price_cents: product.price_cents,
            unit_cost_cents: product.cost_cents,
            total_cents: line_total.cents(),
        });
    }

    let mut products = catalog.to_vec();
    for (idx, qty) in reserved {
        products[idx].stock -= qty;
    }

    let sale = Sale {
        id: sale_id,
        timestamp,
        items,
        total_amount_cents: total_amount.cents(),
        total_profit_cents: total_profit.cents(),
        staff_id: staff.id.clone(),
        staff_name: staff.name.clone(),
    };

    Ok(SalePlan { products, sale })
}

/// A total that no longer fits in `i64` minor units.
fn amount_overflow(product: &Product) -> CoreError {
    CoreError::Validation(ValidationError::OutOfRange {
        field: format!("price of {}", product.id),
        min: 0,
        max: MAX_PRICE_CENTS,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
