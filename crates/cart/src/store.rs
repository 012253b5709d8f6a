//! The in-memory cart and its mutation rules.
//!
//! One `CartStore` is built per page and is the single source of truth for
//! the tab's lifetime. Mutations are synchronous, persist through the
//! injected [`CartArchive`] after every change, and surface
//! user-recoverable conditions through the injected [`Notifier`]. Display
//! code re-renders from [`CartStore::items`] after each mutation. Network
//! synchronization is a separate, explicit operation (see [`crate::sync`]);
//! the store itself never talks to the server.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cacao_core::{Price, ProductId};

use crate::catalog::CatalogSnapshot;
use crate::notify::{Notifier, Severity};
use crate::persist::CartArchive;

/// Image shown for items whose catalog entry carries none.
const PLACEHOLDER_IMAGE: &str = "/static/img/product/placeholder.jpg";

/// One line in the cart.
///
/// Invariant: `1 <= quantity`, and `quantity <= stock_ceiling` unless the
/// ceiling went stale after a catalog refresh reported less stock than the
/// quantity already in the cart. A stale overage is kept (never trimmed)
/// but blocks further increments until checkout revalidates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    /// Last known purchasable maximum for this product.
    pub stock_ceiling: u32,
    pub image: String,
}

impl LineItem {
    /// Line total (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::new(
            self.unit_price.amount * Decimal::from(self.quantity),
            self.unit_price.currency_code,
        )
    }
}

/// User-recoverable cart conditions.
///
/// Each is also surfaced through the notification sink; the cart is left
/// unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The freshest known stock ceiling would be exceeded.
    #[error("maximum stock reached for {0}")]
    MaxStock(ProductId),

    /// The product is not in the cart.
    #[error("item not in cart: {0}")]
    NotFound(ProductId),
}

/// The cart store.
pub struct CartStore {
    items: Vec<LineItem>,
    catalog: CatalogSnapshot,
    archive: CartArchive,
    notifier: Arc<dyn Notifier>,
}

impl CartStore {
    /// Build a store from its collaborators, loading any persisted cart.
    ///
    /// If the checkout flow left the one-shot completion flag behind, the
    /// durable cart is discarded instead of resurrected.
    #[must_use]
    pub fn open(archive: CartArchive, notifier: Arc<dyn Notifier>) -> Self {
        let items = if archive.consume_completion_flag() {
            tracing::debug!("checkout completed, starting with an empty cart");
            Vec::new()
        } else {
            archive.load()
        };
        Self {
            items,
            catalog: CatalogSnapshot::default(),
            archive,
            notifier,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Cart total across all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_price.amount * Decimal::from(item.quantity))
            .sum()
    }

    /// Freshest known stock ceiling: the catalog snapshot wins over the
    /// value supplied with the gesture, which may predate a listing reload.
    fn freshest_ceiling(&self, id: &ProductId, supplied: u32) -> u32 {
        self.catalog.stock(id).unwrap_or(supplied)
    }

    /// Add one unit of a product.
    ///
    /// An existing line is incremented only while below the freshest known
    /// stock ceiling; a new line starts at quantity 1. Persists on success.
    ///
    /// # Errors
    ///
    /// [`StoreError::MaxStock`] when the ceiling is already reached; the
    /// cart is unchanged.
    pub fn add_item(
        &mut self,
        id: ProductId,
        name: &str,
        unit_price: Price,
        available_stock: u32,
    ) -> Result<(), StoreError> {
        let ceiling = self.freshest_ceiling(&id, available_stock);

        if let Some(existing) = self.items.iter_mut().find(|item| item.id == id) {
            if existing.quantity >= ceiling {
                self.notifier.notify("Maximum stock reached", Severity::Error);
                return Err(StoreError::MaxStock(id));
            }
            existing.quantity += 1;
            existing.stock_ceiling = ceiling;
            self.notifier.notify("Quantity updated!", Severity::Success);
        } else {
            let image = self
                .catalog
                .get(&id)
                .and_then(|entry| entry.images.first().cloned())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());
            self.items.push(LineItem {
                id,
                name: name.to_owned(),
                unit_price,
                quantity: 1,
                stock_ceiling: ceiling,
                image,
            });
            self.notifier.notify("Added to cart!", Severity::Success);
        }

        self.persist();
        Ok(())
    }

    /// Remove a line entirely (`full_remove`) or take one unit off it,
    /// deleting the line when it reaches zero. Returns whether the cart
    /// changed; an absent id is a no-op.
    pub fn remove_item(&mut self, id: &ProductId, full_remove: bool) -> bool {
        let Some(pos) = self.items.iter().position(|item| &item.id == id) else {
            return false;
        };

        let delete_line =
            full_remove || self.items.get(pos).is_none_or(|item| item.quantity <= 1);
        if delete_line {
            self.items.remove(pos);
        } else if let Some(item) = self.items.get_mut(pos) {
            item.quantity -= 1;
        }

        self.persist();
        true
    }

    /// Adjust a line's quantity by a signed delta.
    ///
    /// A delta driving the quantity to zero or below removes the line; a
    /// delta that would exceed the stock ceiling is rejected.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is not in the cart,
    /// [`StoreError::MaxStock`] when the ceiling would be exceeded; the
    /// cart is unchanged in both cases.
    pub fn set_quantity(&mut self, id: &ProductId, delta: i32) -> Result<(), StoreError> {
        let Some(pos) = self.items.iter().position(|item| &item.id == id) else {
            self.notifier.notify("Item not in cart", Severity::Error);
            return Err(StoreError::NotFound(id.clone()));
        };
        let (quantity, ceiling) = self
            .items
            .get(pos)
            .map(|item| (item.quantity, item.stock_ceiling))
            .unwrap_or_default();

        let new_quantity = i64::from(quantity) + i64::from(delta);
        if new_quantity <= 0 {
            self.items.remove(pos);
            self.notifier.notify("Removed from cart", Severity::Success);
            self.persist();
            return Ok(());
        }
        if new_quantity > i64::from(ceiling) {
            self.notifier.notify("Maximum stock reached", Severity::Error);
            return Err(StoreError::MaxStock(id.clone()));
        }

        if let Some(item) = self.items.get_mut(pos) {
            item.quantity = u32::try_from(new_quantity).unwrap_or(quantity);
        }
        self.persist();
        Ok(())
    }

    /// Empty the cart and erase durable state.
    ///
    /// The server-side cart is not touched here; callers pair this with
    /// [`crate::sync::SyncClient::clear_remote`], which is best-effort.
    pub fn clear(&mut self) {
        self.items.clear();
        self.archive.erase();
        self.notifier.notify("Cart cleared", Severity::Success);
    }

    /// Mirror the current items into durable storage. Non-fatal.
    pub fn persist(&self) -> bool {
        self.archive.save(&self.items)
    }

    /// Install a freshly fetched catalog snapshot and reconcile stock
    /// ceilings against it.
    ///
    /// Ceilings are overwritten for every id the snapshot knows; quantities
    /// are never trimmed to fit. Ids missing from the snapshot keep their
    /// last known ceiling - stale, not zero.
    pub fn refresh_catalog(&mut self, snapshot: CatalogSnapshot) {
        for item in &mut self.items {
            if let Some(stock) = snapshot.stock(&item.id) {
                if stock != item.stock_ceiling {
                    tracing::debug!(
                        id = %item.id,
                        old = item.stock_ceiling,
                        new = stock,
                        "stock ceiling refreshed"
                    );
                }
                item.stock_ceiling = stock;
            }
        }
        self.catalog = snapshot;
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::notify::test_support::RecordingNotifier;
    use crate::persist::{MemorySlot, StorageSlot};

    fn price(sen: i64) -> Price {
        Price::ringgit(Decimal::new(sen, 2))
    }

    fn store_with(notifier: Arc<RecordingNotifier>) -> (CartStore, MemorySlot) {
        let slot = MemorySlot::new();
        let archive = CartArchive::new(Box::new(slot.clone()));
        (CartStore::open(archive, notifier), slot)
    }

    fn snapshot_with(id: &str, stock: u32) -> CatalogSnapshot {
        [(
            ProductId::new(id),
            CatalogEntry {
                name: format!("Product {id}"),
                price: price(2500),
                stock,
                images: vec![],
                category: None,
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_add_until_ceiling_then_reject() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier.clone());
        let id = ProductId::new("C1");

        for _ in 0..5 {
            store
                .add_item(id.clone(), "Dark 70%", price(2500), 5)
                .expect("below ceiling");
        }
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.item_count(), 5);

        let result = store.add_item(id.clone(), "Dark 70%", price(2500), 5);
        assert_eq!(result, Err(StoreError::MaxStock(id)));
        assert_eq!(store.item_count(), 5);
        assert!(notifier.contains("Maximum stock reached", Severity::Error));
    }

    #[test]
    fn test_add_uses_snapshot_ceiling_over_supplied() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier);
        store.refresh_catalog(snapshot_with("C1", 1));

        let id = ProductId::new("C1");
        store
            .add_item(id.clone(), "Dark 70%", price(2500), 99)
            .expect("first unit fits");
        // the supplied stock claims 99, but the snapshot says 1
        assert_eq!(
            store.add_item(id.clone(), "Dark 70%", price(2500), 99),
            Err(StoreError::MaxStock(id))
        );
    }

    #[test]
    fn test_remove_decrements_then_deletes() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier);
        let id = ProductId::new("C1");
        store
            .add_item(id.clone(), "Dark 70%", price(2500), 5)
            .expect("add");
        store
            .add_item(id.clone(), "Dark 70%", price(2500), 5)
            .expect("add");

        assert!(store.remove_item(&id, false));
        assert_eq!(store.item_count(), 1);

        assert!(store.remove_item(&id, false));
        assert!(store.is_empty());

        // absent id: no-op
        assert!(!store.remove_item(&id, false));
    }

    #[test]
    fn test_full_remove_deletes_line() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier);
        let id = ProductId::new("C1");
        for _ in 0..3 {
            store
                .add_item(id.clone(), "Dark 70%", price(2500), 5)
                .expect("add");
        }

        assert!(store.remove_item(&id, true));
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_quantity_bounds() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier.clone());
        let id = ProductId::new("C1");
        store
            .add_item(id.clone(), "Dark 70%", price(2500), 3)
            .expect("add");

        store.set_quantity(&id, 2).expect("within ceiling");
        assert_eq!(store.item_count(), 3);

        assert_eq!(
            store.set_quantity(&id, 1),
            Err(StoreError::MaxStock(id.clone()))
        );
        assert_eq!(store.item_count(), 3);

        store.set_quantity(&id, -3).expect("drives to zero");
        assert!(store.is_empty());

        assert_eq!(
            store.set_quantity(&id, 1),
            Err(StoreError::NotFound(id))
        );
        assert!(notifier.contains("Item not in cart", Severity::Error));
    }

    #[test]
    fn test_reconcile_lowers_ceiling_without_trimming() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier);
        let id = ProductId::new("C2");
        for _ in 0..3 {
            store
                .add_item(id.clone(), "Milk 40%", price(1800), 3)
                .expect("add");
        }

        store.refresh_catalog(snapshot_with("C2", 1));

        let item = store.items().first().expect("line kept");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.stock_ceiling, 1);

        // a later increment is rejected against the refreshed ceiling
        assert_eq!(
            store.set_quantity(&id, 1),
            Err(StoreError::MaxStock(id))
        );
    }

    #[test]
    fn test_reconcile_keeps_stale_ceiling_for_missing_ids() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier);
        let id = ProductId::new("C3");
        store
            .add_item(id.clone(), "Praline", price(3200), 4)
            .expect("add");

        // snapshot knows nothing about C3
        store.refresh_catalog(snapshot_with("C1", 9));

        let item = store.items().first().expect("line kept");
        assert_eq!(item.stock_ceiling, 4);
    }

    #[test]
    fn test_mutations_persist_and_reload() {
        let notifier = Arc::new(RecordingNotifier::default());
        let slot = MemorySlot::new();
        {
            let archive = CartArchive::new(Box::new(slot.clone()));
            let mut store = CartStore::open(archive, notifier.clone());
            store
                .add_item(ProductId::new("C1"), "Dark 70%", price(2500), 5)
                .expect("add");
        }

        let archive = CartArchive::new(Box::new(slot));
        let reloaded = CartStore::open(archive, notifier);
        assert_eq!(reloaded.item_count(), 1);
        assert_eq!(
            reloaded.items().first().map(|item| item.id.clone()),
            Some(ProductId::new("C1"))
        );
    }

    #[test]
    fn test_clear_erases_durable_state() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, slot) = store_with(notifier);
        store
            .add_item(ProductId::new("C1"), "Dark 70%", price(2500), 5)
            .expect("add");

        store.clear();
        assert!(store.is_empty());
        assert!(slot.get("cacao_cart").expect("memory get").is_none());
    }

    #[test]
    fn test_total_sums_lines() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (mut store, _slot) = store_with(notifier);
        store
            .add_item(ProductId::new("C1"), "Dark 70%", price(2500), 5)
            .expect("add");
        store
            .add_item(ProductId::new("C1"), "Dark 70%", price(2500), 5)
            .expect("add");
        store
            .add_item(ProductId::new("C2"), "Milk 40%", price(1800), 5)
            .expect("add");

        assert_eq!(store.total(), Decimal::new(6800, 2));
        let line = store.items().first().expect("line");
        assert_eq!(line.line_total().amount, Decimal::new(5000, 2));
    }
}
