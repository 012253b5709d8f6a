//! Product catalog snapshot.
//!
//! The product-browsing layer fetches the catalog and hands the engine a
//! fresh snapshot on every listing load. The engine treats it as read-only:
//! it is the source of "freshest known stock" for the cart's ceilings but is
//! never mutated from here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cacao_core::{CategoryId, Price, ProductId};

/// One product's entry in a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub price: Price,
    /// Units currently available for purchase.
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// Read-only snapshot of the product catalog, keyed by product id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    entries: HashMap<ProductId, CatalogEntry>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace or insert a product entry.
    pub fn insert(&mut self, id: ProductId, entry: CatalogEntry) {
        self.entries.insert(id, entry);
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// Current stock for a product, if the snapshot knows it.
    #[must_use]
    pub fn stock(&self, id: &ProductId) -> Option<u32> {
        self.entries.get(id).map(|entry| entry.stock)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ProductId, CatalogEntry)> for CatalogSnapshot {
    fn from_iter<I: IntoIterator<Item = (ProductId, CatalogEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn entry(stock: u32) -> CatalogEntry {
        CatalogEntry {
            name: "Dark 70%".to_owned(),
            price: Price::ringgit(Decimal::new(2500, 2)),
            stock,
            images: vec!["/static/img/product/dark70.jpg".to_owned()],
            category: Some(CategoryId::new("dark")),
        }
    }

    #[test]
    fn test_stock_lookup() {
        let snapshot: CatalogSnapshot = [(ProductId::new("C1"), entry(5))].into_iter().collect();
        assert_eq!(snapshot.stock(&ProductId::new("C1")), Some(5));
        assert_eq!(snapshot.stock(&ProductId::new("C2")), None);
    }

    #[test]
    fn test_snapshot_deserializes_without_optional_fields() {
        let json = r#"{"entries": {"C1": {"name": "Dark 70%", "price": {"amount": "25.00", "currency_code": "MYR"}, "stock": 5}}}"#;
        let snapshot: CatalogSnapshot = serde_json::from_str(json).expect("valid snapshot");
        assert_eq!(snapshot.stock(&ProductId::new("C1")), Some(5));
        let entry = snapshot.get(&ProductId::new("C1")).expect("entry present");
        assert!(entry.images.is_empty());
        assert!(entry.category.is_none());
    }
}
