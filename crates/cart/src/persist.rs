//! Durable cart storage.
//!
//! The cart lives in memory for the tab's lifetime; this module keeps a
//! serialized copy in a per-profile storage slot so a reload resurrects it.
//! Storage is strictly best-effort: a failed save is logged and the
//! in-memory cart stays authoritative, and a missing or malformed payload
//! loads as an empty cart. The slot is not locked against concurrent
//! writers; the last save wins.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{CartStore, LineItem};

/// Storage keys used by the cart engine.
mod keys {
    /// Slot holding the serialized cart.
    pub const CART: &str = "cacao_cart";

    /// One-shot flag set by the checkout flow after a completed purchase.
    pub const CHECKOUT_COMPLETED: &str = "checkout_completed";
}

/// Errors raised by a storage slot.
///
/// These never reach the user; the adapter logs them and fails open.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (quota, permissions, disk).
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored payload could not be serialized or deserialized.
    #[error("malformed stored payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A named durable key-value slot, one per storage partition.
pub trait StorageSlot: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written (e.g. quota exceeded).
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be modified.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-per-key slot rooted at a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StorageSlot for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory slot with shared contents.
///
/// Clones share the same map, so a handle kept outside the adapter can
/// observe what was written. Used for ephemeral sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Envelope written to the cart slot.
///
/// `saved_at` is a diagnostic stamp only; it takes no part in conflict
/// resolution (last save wins).
#[derive(Debug, Serialize, Deserialize)]
struct SavedCart {
    saved_at: i64,
    items: Vec<LineItem>,
}

fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}

/// Durability adapter for the cart.
///
/// Owns the storage slot and only ever mirrors the in-memory cart into it;
/// it never originates cart mutations.
pub struct CartArchive {
    slot: Box<dyn StorageSlot>,
}

impl CartArchive {
    #[must_use]
    pub fn new(slot: Box<dyn StorageSlot>) -> Self {
        Self { slot }
    }

    /// Persist the given items. Returns whether the write landed; failures
    /// are logged and otherwise swallowed.
    pub fn save(&self, items: &[LineItem]) -> bool {
        let envelope = SavedCart {
            saved_at: unix_now(),
            items: items.to_vec(),
        };
        let result = serde_json::to_string(&envelope)
            .map_err(StorageError::from)
            .and_then(|json| self.slot.put(keys::CART, &json));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("failed to persist cart: {e}");
                false
            }
        }
    }

    /// Load the persisted cart. Missing or malformed data loads as empty.
    #[must_use]
    pub fn load(&self) -> Vec<LineItem> {
        match self.slot.get(keys::CART) {
            Ok(Some(json)) => match serde_json::from_str::<SavedCart>(&json) {
                Ok(saved) => saved.items,
                Err(e) => {
                    tracing::warn!("stored cart is malformed, starting empty: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read stored cart, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Remove the durable cart.
    pub fn erase(&self) {
        if let Err(e) = self.slot.remove(keys::CART) {
            tracing::warn!("failed to erase stored cart: {e}");
        }
    }

    /// Record that a purchase just completed. Called by the checkout flow
    /// before redirecting back into the shop.
    pub fn mark_checkout_completed(&self) {
        if let Err(e) = self.slot.put(keys::CHECKOUT_COMPLETED, "true") {
            tracing::warn!("failed to set checkout-completed flag: {e}");
        }
    }

    /// One-shot check of the checkout-completed flag.
    ///
    /// If set, the durable cart and the flag itself are erased and `true`
    /// is returned, so the store starts empty instead of resurrecting a
    /// cart that was already purchased. A storage failure reads as "not
    /// set".
    pub fn consume_completion_flag(&self) -> bool {
        match self.slot.get(keys::CHECKOUT_COMPLETED) {
            Ok(Some(_)) => {
                self.erase();
                if let Err(e) = self.slot.remove(keys::CHECKOUT_COMPLETED) {
                    tracing::warn!("failed to clear checkout-completed flag: {e}");
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("failed to read checkout-completed flag: {e}");
                false
            }
        }
    }
}

/// Periodic flush of a shared store.
///
/// Every mutation already persists, so this only covers save paths that
/// slipped through; the redundant I/O is accepted. The returned handle can
/// be aborted at shutdown.
pub fn spawn_autosave(
    store: Arc<Mutex<CartStore>>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            {
                let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
                if !guard.is_empty() {
                    guard.persist();
                    tracing::debug!(items = guard.items().len(), "autosaved cart");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cacao_core::{Price, ProductId};

    use super::*;

    fn item(id: &str, quantity: u32) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Price::ringgit(Decimal::new(2500, 2)),
            quantity,
            stock_ceiling: 5,
            image: "/static/img/product/placeholder.jpg".to_owned(),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let archive = CartArchive::new(Box::new(MemorySlot::new()));
        let items = vec![item("C1", 2), item("C2", 1)];

        assert!(archive.save(&items));
        assert_eq!(archive.load(), items);
    }

    #[test]
    fn test_load_missing_slot_is_empty() {
        let archive = CartArchive::new(Box::new(MemorySlot::new()));
        assert!(archive.load().is_empty());
    }

    #[test]
    fn test_load_malformed_payload_fails_open() {
        let slot = MemorySlot::new();
        slot.put(super::keys::CART, "{not json").expect("memory put");

        let archive = CartArchive::new(Box::new(slot));
        assert!(archive.load().is_empty());
    }

    #[test]
    fn test_completion_flag_is_one_shot() {
        let slot = MemorySlot::new();
        let archive = CartArchive::new(Box::new(slot.clone()));
        archive.save(&[item("C1", 1)]);
        archive.mark_checkout_completed();

        assert!(archive.consume_completion_flag());
        assert!(archive.load().is_empty());

        // second call: flag already consumed, nothing further changes
        assert!(!archive.consume_completion_flag());
        assert!(slot.get(super::keys::CART).expect("memory get").is_none());
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("slots"));

        assert!(store.get("cacao_cart").expect("get").is_none());
        store.put("cacao_cart", "{}").expect("put");
        assert_eq!(store.get("cacao_cart").expect("get").as_deref(), Some("{}"));
        store.remove("cacao_cart").expect("remove");
        assert!(store.get("cacao_cart").expect("get").is_none());

        // removing twice is fine
        store.remove("cacao_cart").expect("remove absent");
    }
}
