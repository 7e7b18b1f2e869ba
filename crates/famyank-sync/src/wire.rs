//! # Catalog HTTP Wire Types
//!
//! ```text
//! GET  /api/products                       → [Product, ...]
//! PUT  /api/products  { "products": [...] } → { "count": n }
//! any failure                              → { "code": "...", "message": "..." }
//! ```

use famyank_core::Product;
use famyank_store::ErrorCode;
use serde::{Deserialize, Serialize};

/// Header carrying the caller's node id.
pub const NODE_HEADER: &str = "x-famyank-node";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductsPayload {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}
