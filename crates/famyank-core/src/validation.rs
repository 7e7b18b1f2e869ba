//! # Validation Module
//!
//! Input validation for catalog edits, carts and staff accounts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web UI                                                       │
//! │  └── Immediate feedback (empty fields, number inputs)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: PosStore operation                                           │
//! │  └── THIS MODULE: runs before any state is touched                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Checkout planning                                            │
//! │  └── Stock and existence against the current catalog                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{CartLine, Product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, numbers, hyphens and underscores
///
/// ## Example
/// ```rust
/// use famyank_core::validation::validate_sku;
///
/// assert!(validate_sku("FY-SH-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("FY SH 001").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: required, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a login email. Deliberately loose: one `@` with text on both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative amount or count. Zero is allowed.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative value no larger than `max`.
pub fn validate_bounded(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    validate_non_negative(field, value)?;
    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a product before it enters the catalog.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }
    validate_sku(&product.sku)?;
    validate_product_name(&product.name)?;
    validate_bounded("price", product.price_cents, MAX_PRICE_CENTS)?;
    validate_bounded("cost", product.cost_cents, MAX_PRICE_CENTS)?;
    validate_bounded("stock", product.stock, MAX_STOCK)?;
    Ok(())
}

/// Validates a whole catalog: each product, and no id twice.
pub fn validate_catalog(products: &[Product]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(products.len());
    for product in products {
        validate_product(product)?;
        if !seen.insert(product.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "id".to_string(),
                value: product.id.clone(),
            });
        }
    }
    Ok(())
}

/// Validates the shape of a cart: line count and quantities.
///
/// An empty cart is reported by checkout as `CoreError::EmptyCart`.
pub fn validate_cart_lines(cart: &[CartLine]) -> ValidationResult<()> {
    if cart.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }
    for line in cart {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::required("productId"));
        }
        validate_quantity(line.quantity)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
