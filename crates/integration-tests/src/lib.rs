//! Integration tests for the Cacao cart client.
//!
//! # Test Categories
//!
//! - `cart_flow` - store + persistence scenarios across reloads
//! - `sync_flow` - remote sync scenarios against a scripted transport
//! - `autosave` - the periodic flush task
//!
//! The shared fakes live in this library so every test file wires the
//! engine the same way: a [`RecordingNotifier`] standing in for the toast
//! layer and a [`ScriptedTransport`] standing in for the server's cart
//! endpoints.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::SecretString;

use cacao_cart::notify::{Notifier, Severity};
use cacao_cart::persist::{CartArchive, MemorySlot};
use cacao_cart::store::CartStore;
use cacao_cart::sync::{CartTransport, SyncError};
use cacao_core::ProductId;

/// Notifier that records every message for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn contains(&self, needle: &str, severity: Severity) -> bool {
        self.messages()
            .iter()
            .any(|(message, recorded)| message.contains(needle) && *recorded == severity)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_owned(), severity));
    }
}

/// Transport that records calls and fails scripted product ids.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    fail_ids: Vec<ProductId>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Transport where upserts for the given ids are refused by the server.
    #[must_use]
    pub fn failing(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(|id| ProductId::new(*id)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl CartTransport for &ScriptedTransport {
    async fn upsert_line(
        &self,
        _token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), SyncError> {
        self.record(format!("upsert {id} x{quantity}"));
        if self.fail_ids.contains(id) {
            return Err(SyncError::Rejected("Not enough stock".to_owned()));
        }
        Ok(())
    }

    async fn clear(&self, _token: &SecretString) -> Result<(), SyncError> {
        self.record("clear".to_owned());
        Ok(())
    }
}

/// Open a store over the given slot with a recording notifier.
#[must_use]
pub fn open_store(slot: &MemorySlot, notifier: Arc<RecordingNotifier>) -> CartStore {
    CartStore::open(CartArchive::new(Box::new(slot.clone())), notifier)
}
