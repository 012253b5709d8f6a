//! Cacao Core - Shared types library.
//!
//! This crate provides the common types used across the Cacao cart
//! components:
//!
//! - `cart` - the client-side cart engine
//! - `cli` - command-line harness for driving the engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no network clients. This
//! keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
