//! User-facing notification sink.
//!
//! The storefront shell renders these as toast popups; the engine only ever
//! fires them and never consumes a return value.

use std::fmt;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Fire-and-forget sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Notifier that forwards messages to the `tracing` log stream.
///
/// Useful for headless embeddings (and the CLI) where no toast layer exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => tracing::info!(target: "cacao_cart::toast", "{message}"),
            Severity::Error => tracing::warn!(target: "cacao_cart::toast", "{message}"),
        }
    }
}
