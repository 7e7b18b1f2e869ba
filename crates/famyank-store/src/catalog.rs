//! # Catalog
//!
//! The in-memory product collection owned by the store. Operations here are
//! pure: the store clones the catalog, applies one of these, persists the
//! result and only then swaps it in.

use famyank_core::seed::default_products;
use famyank_core::validation::{validate_catalog, validate_product};
use famyank_core::{CoreError, CoreResult, Product};
use serde::{Deserialize, Serialize};

/// Products in insertion order. Persisted as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    pub fn defaults() -> Self {
        Catalog::new(default_products())
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Appends a product whose id is not yet taken.
    pub fn add(&mut self, product: Product) -> CoreResult<()> {
        validate_product(&product)?;
        if self.get(&product.id).is_some() {
            return Err(CoreError::DuplicateId(product.id));
        }
        self.products.push(product);
        Ok(())
    }

    /// Replaces the product with the same id, keeping its position.
    pub fn update(&mut self, product: Product) -> CoreResult<()> {
        validate_product(&product)?;
        let slot = self
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| CoreError::ProductNotFound(product.id.clone()))?;
        *slot = product;
        Ok(())
    }

    /// Validates a whole replacement catalog.
    pub fn checked(products: Vec<Product>) -> CoreResult<Self> {
        validate_catalog(&products)?;
        Ok(Catalog::new(products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> Product {
        Product {
            id: id.into(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            description: String::new(),
            category: "Apparel".into(),
            price_cents: 1_000,
            cost_cents: 400,
            stock: 5,
            image: String::new(),
        }
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut catalog = Catalog::new(vec![product("A")]);
        let err = catalog.add(product("A")).unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("A".into()));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_update_keeps_position() {
        let mut catalog = Catalog::new(vec![product("A"), product("B")]);
        let mut b = product("B");
        b.stock = 99;
        catalog.update(b).unwrap();

        assert_eq!(catalog.products()[1].stock, 99);
        assert_eq!(catalog.products()[0].id, "A");
    }

    #[test]
    fn test_update_unknown_id() {
        let mut catalog = Catalog::new(vec![product("A")]);
        assert_eq!(
            catalog.update(product("Z")).unwrap_err(),
            CoreError::ProductNotFound("Z".into())
        );
    }

    #[test]
    fn test_invalid_product_rejected() {
        let mut catalog = Catalog::default();
        let mut bad = product("A");
        bad.stock = -1;
        assert!(matches!(catalog.add(bad), Err(CoreError::Validation(_))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_checked_rejects_duplicates() {
        assert!(Catalog::checked(vec![product("A"), product("A")]).is_err());
        assert_eq!(Catalog::checked(vec![product("A"), product("B")]).unwrap().len(), 2);
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&Catalog::new(vec![product("A")])).unwrap();
        assert!(json.starts_with('['));
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("A").map(|p| p.stock), Some(5));
    }
}
