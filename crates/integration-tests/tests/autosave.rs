//! The periodic flush task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;

use cacao_cart::persist::{MemorySlot, StorageSlot, spawn_autosave};
use cacao_core::{Price, ProductId};

use cacao_integration_tests::{RecordingNotifier, open_store};

#[tokio::test]
async fn test_autosave_rewrites_the_slot_between_ticks() {
    let slot = MemorySlot::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let mut store = open_store(&slot, notifier);
    store
        .add_item(
            ProductId::new("C1"),
            "Dark 70%",
            Price::ringgit(Decimal::new(2500, 2)),
            5,
        )
        .expect("add");

    let store = Arc::new(Mutex::new(store));
    let task = spawn_autosave(store.clone(), Duration::from_millis(20));

    // lose the durable copy behind the engine's back; the next tick
    // restores it even though no mutation ran
    slot.remove("cacao_cart").expect("remove");
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(slot.get("cacao_cart").expect("get").is_some());
    task.abort();
}

#[tokio::test]
async fn test_autosave_skips_an_empty_cart() {
    let slot = MemorySlot::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let store = open_store(&slot, notifier);

    let store = Arc::new(Mutex::new(store));
    let task = spawn_autosave(store, Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(slot.get("cacao_cart").expect("get").is_none());
    task.abort();
}
