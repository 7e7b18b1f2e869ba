//! Seed data: the default catalog used on first start and by
//! "restore defaults", and the two starting staff accounts.

use crate::currency::usd_to_ghs;
use crate::money::Money;
use crate::types::{Product, UserAccount, UserRole};

/// Email of the seeded administrator.
pub const SEED_ADMIN_EMAIL: &str = "admin@famyank.com";

struct SeedProduct {
    id: &'static str,
    sku: &'static str,
    name: &'static str,
    description: &'static str,
    /// USD price as (major, minor).
    price_usd: (i64, i64),
    cost_usd: (i64, i64),
    stock: i64,
    category: &'static str,
    image_seed: &'static str,
}

const SEED_PRODUCTS: [SeedProduct; 4] = [
    SeedProduct {
        id: "1",
        sku: "FY-SH-001",
        name: "Classic White Shirt",
        description: "100% Cotton premium white shirt",
        price_usd: (45, 0),
        cost_usd: (20, 0),
        stock: 50,
        category: "Apparel",
        image_seed: "shirt",
    },
    SeedProduct {
        id: "2",
        sku: "FY-JN-002",
        name: "Slim Fit Jeans",
        description: "Durable blue denim slim fit jeans",
        price_usd: (89, 99),
        cost_usd: (40, 0),
        stock: 35,
        category: "Apparel",
        image_seed: "jeans",
    },
    SeedProduct {
        id: "3",
        sku: "FY-JK-003",
        name: "Winter Bomber Jacket",
        description: "Insulated waterproof bomber jacket",
        price_usd: (120, 0),
        cost_usd: (65, 0),
        stock: 12,
        category: "Outerwear",
        image_seed: "jacket",
    },
    SeedProduct {
        id: "4",
        sku: "FY-SN-004",
        name: "Urban Sneakers",
        description: "Lightweight breathable mesh sneakers",
        price_usd: (75, 0),
        cost_usd: (35, 0),
        stock: 20,
        category: "Footwear",
        image_seed: "shoes",
    },
];

/// The default catalog, priced in GHS from the USD list prices.
pub fn default_products() -> Vec<Product> {
    SEED_PRODUCTS
        .iter()
        .map(|seed| Product {
            id: seed.id.to_string(),
            sku: seed.sku.to_string(),
            name: seed.name.to_string(),
            description: seed.description.to_string(),
            category: seed.category.to_string(),
            price_cents: usd_to_ghs(Money::from_major_minor(seed.price_usd.0, seed.price_usd.1))
                .cents(),
            cost_cents: usd_to_ghs(Money::from_major_minor(seed.cost_usd.0, seed.cost_usd.1))
                .cents(),
            stock: seed.stock,
            image: format!("https://picsum.photos/seed/{}/400/400", seed.image_seed),
        })
        .collect()
}

/// The starting staff accounts. They carry no credential; the store may
/// attach a bootstrap password to the admin when it seeds them.
pub fn seed_users() -> Vec<UserAccount> {
    vec![
        UserAccount {
            id: "u1".to_string(),
            name: "Admin Francisca".to_string(),
            role: UserRole::Admin,
            email: SEED_ADMIN_EMAIL.to_string(),
            password_hash: None,
            legacy_password: None,
        },
        UserAccount {
            id: "u2".to_string(),
            name: "Francisca Worker".to_string(),
            role: UserRole::Worker,
            email: "Francisca@famyank.com".to_string(),
            password_hash: None,
            legacy_password: None,
        },
    ]
}
