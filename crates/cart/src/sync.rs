//! Remote cart synchronization.
//!
//! The client-held cart is authoritative; this module pushes it to the
//! server-side cart, one upsert per line item, strictly sequentially so the
//! server never sees more than one write in flight for the same user.
//! Callers clear the remote cart first (best-effort) so a sync pass always
//! starts from a known-empty state and repeating it is harmless.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use cacao_core::ProductId;

use crate::config::CartConfig;
use crate::notify::{Notifier, Severity};
use crate::store::LineItem;
use crate::token::TokenSource;

/// Header carrying the per-request security token.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Errors raised while talking to the cart endpoints.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No security token is available. Fatal precondition: nothing is sent.
    #[error("security token missing")]
    MissingToken,

    /// There is nothing to push.
    #[error("cart is empty")]
    EmptyCart,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered but refused the operation.
    #[error("server rejected the request: {0}")]
    Rejected(String),

    /// Endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Aggregate outcome of a full-cart sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub success_count: usize,
    pub fail_count: usize,
}

impl SyncReport {
    /// Whether every line landed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.fail_count == 0
    }
}

/// Wire format of the cart endpoints' JSON response.
#[derive(Debug, Deserialize)]
struct CartEndpointResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// One-request-at-a-time transport to the server-side cart.
///
/// This is the seam that lets sync behavior be tested deterministically:
/// production uses [`HttpCartTransport`], tests use a scripted in-memory
/// implementation. Only used through generics, never as a trait object.
#[allow(async_fn_in_trait)]
pub trait CartTransport: Send + Sync {
    /// Upsert one line; the quantity replaces the server-side quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] when the request fails or is refused.
    async fn upsert_line(
        &self,
        token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), SyncError>;

    /// Clear the server-side cart.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] when the request fails or is refused.
    async fn clear(&self, token: &SecretString) -> Result<(), SyncError>;
}

/// REST transport speaking to the storefront's cart endpoints.
#[derive(Clone)]
pub struct HttpCartTransport {
    inner: Arc<HttpCartTransportInner>,
}

struct HttpCartTransportInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartTransport {
    /// Create a transport for the configured server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CartConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            inner: Arc::new(HttpCartTransportInner {
                client,
                base_url: config.server_url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        Ok(self.inner.base_url.join(path)?)
    }
}

impl CartTransport for HttpCartTransport {
    async fn upsert_line(
        &self,
        token: &SecretString,
        id: &ProductId,
        quantity: u32,
    ) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("cart/add/{id}/"))?;
        let form = [
            ("quantity", quantity.to_string()),
            ("sync", "true".to_owned()),
        ];

        let response = self
            .inner
            .client
            .post(url)
            .header(CSRF_HEADER, token.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<CartEndpointResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(SyncError::Rejected(message));
        }

        let body: CartEndpointResponse = response.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(SyncError::Rejected(
                body.error.unwrap_or_else(|| "unknown error".to_owned()),
            ))
        }
    }

    async fn clear(&self, token: &SecretString) -> Result<(), SyncError> {
        let url = self.endpoint("cart/clear/")?;
        let response = self
            .inner
            .client
            .post(url)
            .header(CSRF_HEADER, token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::Rejected(format!("HTTP {status}")))
        }
    }
}

/// Client that pushes the cart to the server and reports the outcome.
pub struct SyncClient<T> {
    transport: T,
    tokens: Arc<dyn TokenSource>,
    notifier: Arc<dyn Notifier>,
}

impl<T: CartTransport> SyncClient<T> {
    #[must_use]
    pub fn new(transport: T, tokens: Arc<dyn TokenSource>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            transport,
            tokens,
            notifier,
        }
    }

    fn require_token(&self) -> Result<SecretString, SyncError> {
        self.tokens.token().ok_or_else(|| {
            self.notifier.notify(
                "Security token missing. Please refresh the page.",
                Severity::Error,
            );
            SyncError::MissingToken
        })
    }

    /// Push every line item to the server, strictly sequentially.
    ///
    /// A failed line is surfaced and counted but does not stop the
    /// remaining lines from being attempted.
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingToken`] when no security token is available;
    /// nothing is sent in that case. Per-line failures are reported in the
    /// [`SyncReport`], not as errors.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn sync_all(&self, items: &[LineItem]) -> Result<SyncReport, SyncError> {
        let token = self.require_token()?;

        let mut report = SyncReport::default();
        for item in items {
            match self
                .transport
                .upsert_line(&token, &item.id, item.quantity)
                .await
            {
                Ok(()) => report.success_count += 1,
                Err(e) => {
                    tracing::warn!(id = %item.id, "failed to sync line: {e}");
                    let message = match &e {
                        SyncError::Rejected(reason) => reason.clone(),
                        _ => format!("Failed to add {}", item.name),
                    };
                    self.notifier.notify(&message, Severity::Error);
                    report.fail_count += 1;
                }
            }
        }

        if report.is_complete() {
            tracing::debug!(synced = report.success_count, "cart sync complete");
        } else {
            self.notifier.notify(
                &format!(
                    "Some items failed to sync ({}/{})",
                    report.fail_count,
                    items.len()
                ),
                Severity::Error,
            );
        }
        Ok(report)
    }

    /// Best-effort server-side clear; failures are logged and swallowed.
    pub async fn clear_remote(&self) {
        let Some(token) = self.tokens.token() else {
            tracing::debug!("skipping remote clear, no security token");
            return;
        };
        if let Err(e) = self.transport.clear(&token).await {
            tracing::debug!("remote cart clear failed (ignored): {e}");
        }
    }

    /// Quiet reconciliation pass after a purely client-side removal: clear
    /// the remote cart and resend the current lines. Everything is
    /// best-effort so the gesture flow is never interrupted; failures are
    /// only logged.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn resync(&self, items: &[LineItem]) {
        let Some(token) = self.tokens.token() else {
            tracing::debug!("skipping resync, no security token");
            return;
        };
        if let Err(e) = self.transport.clear(&token).await {
            tracing::debug!("resync clear failed (ignored): {e}");
        }
        for item in items {
            if let Err(e) = self
                .transport
                .upsert_line(&token, &item.id, item.quantity)
                .await
            {
                tracing::debug!(id = %item.id, "resync upsert failed (ignored): {e}");
            }
        }
    }

    /// Checkout preparation: put the remote cart into a known-empty state,
    /// then run the full sync pass. Callers proceed to checkout only when
    /// the returned report is complete.
    ///
    /// # Errors
    ///
    /// [`SyncError::EmptyCart`] when there is nothing to push (no request
    /// is made), [`SyncError::MissingToken`] when no token is available.
    pub async fn prepare_checkout(&self, items: &[LineItem]) -> Result<SyncReport, SyncError> {
        if items.is_empty() {
            self.notifier.notify("Your cart is empty", Severity::Error);
            return Err(SyncError::EmptyCart);
        }
        self.clear_remote().await;
        self.sync_all(items).await
    }
}
