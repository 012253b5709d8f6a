//! Cacao Cart - client-side cart engine for the Cacao chocolate storefront.
//!
//! The cart held by the client is authoritative for the session: the store
//! mutates it in memory, the persistence adapter mirrors it into a durable
//! slot, and the sync client pushes it to the server-side cart when the
//! user heads for checkout. The server performs the actual business logic;
//! this crate is the stateful glue in front of it.
//!
//! # Modules
//!
//! - [`store`] - in-memory cart, single source of truth for the session
//! - [`persist`] - durable storage slot, fail-open adapter, autosave task
//! - [`catalog`] - read-only product snapshot and stock reconciliation
//! - [`sync`] - sequential push of cart state to the server cart endpoints
//! - [`dragdrop`] - gesture state machine feeding the store
//! - [`notify`], [`token`] - collaborator seams (toast sink, CSRF token)
//! - [`config`] - environment-driven configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use cacao_cart::config::CartConfig;
//! use cacao_cart::notify::TracingNotifier;
//! use cacao_cart::persist::{CartArchive, JsonFileStore};
//! use cacao_cart::store::CartStore;
//! use cacao_cart::sync::{HttpCartTransport, SyncClient};
//! use cacao_cart::token::CookieTokenSource;
//!
//! let config = CartConfig::from_env()?;
//! let notifier = Arc::new(TracingNotifier);
//! let archive = CartArchive::new(Box::new(JsonFileStore::new(&config.storage_dir)));
//! let mut store = CartStore::open(archive, notifier.clone());
//!
//! let tokens = Arc::new(CookieTokenSource::new(
//!     config.cookies.clone().unwrap_or_default(),
//!     config.token_cookie.clone(),
//! ));
//! let sync = SyncClient::new(HttpCartTransport::new(&config)?, tokens, notifier);
//!
//! store.add_item("C1".into(), "Dark 70%", price, 5)?;
//! let report = sync.prepare_checkout(store.items()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod dragdrop;
pub mod notify;
pub mod persist;
pub mod store;
pub mod sync;
pub mod token;
