//! # Dashboard
//!
//! The admin overview, computed from one consistent snapshot.

use famyank_core::reports::{
    category_breakdown, low_stock, recent_sales, summarize, CategoryStock, SalesSummary,
};
use famyank_core::{Product, Sale};
use serde::Serialize;

use crate::store::PosStore;

/// Number of sales shown under "recent activity".
pub const RECENT_SALES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: SalesSummary,
    pub product_count: usize,
    pub units_in_stock: i64,
    pub low_stock: Vec<Product>,
    pub categories: Vec<CategoryStock>,
    /// Newest first.
    pub recent_sales: Vec<Sale>,
}

impl PosStore {
    pub fn dashboard(&self) -> Dashboard {
        let state = self.read();
        let products = state.catalog.products();
        let sales = state.ledger.sales();

        Dashboard {
            summary: summarize(sales),
            product_count: products.len(),
            units_in_stock: products.iter().map(|p| p.stock).sum(),
            low_stock: low_stock(products, self.config().low_stock_threshold)
                .into_iter()
                .cloned()
                .collect(),
            categories: category_breakdown(products),
            recent_sales: recent_sales(sales, RECENT_SALES)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}
