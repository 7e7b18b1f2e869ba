//! # Reports
//!
//! Read-only aggregations over catalog and ledger snapshots: the figures the
//! dashboard, reports page and receipt screens show.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, TaxRate};
use crate::types::{Product, Sale};

/// Stock level below which a product counts as running low.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Stock
// =============================================================================

/// Products with stock strictly below `threshold`, in catalog order.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock(threshold)).collect()
}

/// Stock held in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryStock {
    pub category: String,
    pub product_count: usize,
    pub units_in_stock: i64,
    /// Units valued at selling price.
    pub stock_value_cents: i64,
}

/// Per-category stock, most units first, ties by name.
///
/// Products with a blank category are grouped under `Other`.
pub fn category_breakdown(products: &[Product]) -> Vec<CategoryStock> {
    let mut groups: BTreeMap<&str, CategoryStock> = BTreeMap::new();
    for product in products {
        let name = match product.category.trim() {
            "" => "Other",
            category => category,
        };
        let entry = groups.entry(name).or_insert_with(|| CategoryStock {
            category: name.to_string(),
            product_count: 0,
            units_in_stock: 0,
            stock_value_cents: 0,
        });
        entry.product_count += 1;
        entry.units_in_stock += product.stock;
        entry.stock_value_cents += product.price().multiply_quantity(product.stock).cents();
    }

    let mut breakdown: Vec<CategoryStock> = groups.into_values().collect();
    breakdown.sort_by(|a, b| {
        b.units_in_stock
            .cmp(&a.units_in_stock)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// The category holding the most units.
pub fn top_category(products: &[Product]) -> Option<CategoryStock> {
    category_breakdown(products).into_iter().next()
}

// =============================================================================
// Sales
// =============================================================================

/// Ledger-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub order_count: usize,
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub average_transaction_cents: i64,
    pub average_profit_cents: i64,
    /// Profit over revenue in basis points; absent when there is no revenue.
    pub profit_margin_bps: Option<i64>,
}

pub fn summarize(sales: &[Sale]) -> SalesSummary {
    let order_count = sales.len();
    let revenue: Money = sales.iter().map(Sale::total_amount).sum();
    let profit: Money = sales.iter().map(Sale::total_profit).sum();

    let profit_margin_bps = if revenue.is_zero() {
        None
    } else {
        Some((profit.cents() as i128 * 10_000 / revenue.cents() as i128) as i64)
    };

    SalesSummary {
        order_count,
        total_revenue_cents: revenue.cents(),
        total_profit_cents: profit.cents(),
        average_transaction_cents: revenue.div_round(order_count as i64).cents(),
        average_profit_cents: profit.div_round(order_count as i64).cents(),
        profit_margin_bps,
    }
}

/// Totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyReport {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub total_sales_cents: i64,
    pub total_profit_cents: i64,
    pub order_count: usize,
}

/// Groups sales by UTC day, oldest day first.
pub fn daily_reports(sales: &[Sale]) -> Vec<DailyReport> {
    let mut days: BTreeMap<chrono::NaiveDate, DailyReport> = BTreeMap::new();
    for sale in sales {
        let day = sale.timestamp.date_naive();
        let report = days.entry(day).or_insert_with(|| DailyReport {
            date: day.format("%Y-%m-%d").to_string(),
            total_sales_cents: 0,
            total_profit_cents: 0,
            order_count: 0,
        });
        report.total_sales_cents += sale.total_amount_cents;
        report.total_profit_cents += sale.total_profit_cents;
        report.order_count += 1;
    }
    days.into_values().collect()
}

/// The last `n` sales, newest first.
pub fn recent_sales(sales: &[Sale], n: usize) -> Vec<&Sale> {
    sales.iter().rev().take(n).collect()
}

// =============================================================================
// Receipt
// =============================================================================

/// Figures printed on a receipt. Tax applies to the sale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub sale_id: String,
    pub staff_name: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub total_cents: i64,
}

impl Receipt {
    pub fn new(sale: &Sale, tax_rate: TaxRate) -> Self {
        let subtotal = sale.total_amount();
        let tax = subtotal.calculate_tax(tax_rate);
        Receipt {
            sale_id: sale.id.clone(),
            staff_name: sale.staff_name.clone(),
            lines: sale
                .items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    total_cents: item.total_cents,
                })
                .collect(),
            subtotal_cents: subtotal.cents(),
            tax_rate_bps: tax_rate.bps(),
            tax_cents: tax.cents(),
            grand_total_cents: (subtotal + tax).cents(),
        }
    }

    /// Plain-text body in the store's share format.
    pub fn to_text(&self, currency: crate::currency::Currency) -> String {
        let mut out = format!(
            "RECEIPT\n\nTransaction ID: {}\nStaff: {}\n\n--- ITEMS ---\n",
            self.sale_id, self.staff_name
        );
        for line in &self.lines {
            out.push_str(&format!(
                "{} x{}: {}\n",
                line.name,
                line.quantity,
                currency.format(Money::from_cents(line.total_cents))
            ));
        }
        out.push_str(&format!(
            "\nSubtotal: {}\nTax ({}): {}\nGrand Total: {}",
            currency.format(Money::from_cents(self.subtotal_cents)),
            TaxRate::from_bps(self.tax_rate_bps),
            currency.format(Money::from_cents(self.tax_cents)),
            currency.format(Money::from_cents(self.grand_total_cents)),
        ));
        out
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
