//! Security-token lookup.
//!
//! The cart endpoints require a per-request CSRF token that the server hands
//! out as a cookie. The engine never stores the token itself; it asks a
//! [`TokenSource`] at the moment a sync pass starts.

use secrecy::SecretString;

/// Source of the per-request security token.
pub trait TokenSource: Send + Sync {
    /// The current token, if one is available.
    fn token(&self) -> Option<SecretString>;
}

/// Reads a named cookie out of a raw `Cookie` header string.
#[derive(Debug, Clone)]
pub struct CookieTokenSource {
    cookies: String,
    name: String,
}

impl CookieTokenSource {
    /// Create a source over a raw cookie string (e.g. `"a=1; csrftoken=x"`).
    pub fn new(cookies: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
            name: name.into(),
        }
    }
}

impl TokenSource for CookieTokenSource {
    fn token(&self) -> Option<SecretString> {
        read_cookie(&self.cookies, &self.name).map(SecretString::from)
    }
}

/// A token supplied directly, bypassing cookie parsing.
#[derive(Clone)]
pub struct FixedTokenSource(SecretString);

impl FixedTokenSource {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl TokenSource for FixedTokenSource {
    fn token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

/// Find a cookie value by name, percent-decoded.
///
/// Returns `None` when the name is absent. Malformed pairs (no `=`) are
/// skipped rather than treated as an error.
#[must_use]
pub fn read_cookie(cookies: &str, name: &str) -> Option<String> {
    for part in cookies.split(';') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        if key == name {
            let decoded = urlencoding::decode(value)
                .map_or_else(|_| value.to_owned(), std::borrow::Cow::into_owned);
            return Some(decoded);
        }
    }
    None
}
