//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CACAO_SERVER_URL` - Base URL of the storefront server
//!
//! ## Optional
//! - `CACAO_TOKEN_COOKIE` - Name of the cookie holding the security token
//!   (default: `csrftoken`)
//! - `CACAO_COOKIES` - Raw cookie string to read the token from
//! - `CACAO_STORAGE_DIR` - Directory backing the durable storage slot
//!   (default: `.cacao`)
//! - `CACAO_AUTOSAVE_SECS` - Periodic cart flush interval (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default cookie name carrying the security token.
const DEFAULT_TOKEN_COOKIE: &str = "csrftoken";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL of the storefront server (always ends with `/` so endpoint
    /// paths join cleanly)
    pub server_url: Url,
    /// Name of the cookie holding the security token
    pub token_cookie: String,
    /// Raw cookie string, when the embedding supplies one up front
    pub cookies: Option<String>,
    /// Directory backing the durable storage slot
    pub storage_dir: PathBuf,
    /// Periodic cart flush interval
    pub autosave_interval: Duration,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let server_url = parse_base_url(&get_required_env("CACAO_SERVER_URL")?)?;
        let token_cookie = get_env_or_default("CACAO_TOKEN_COOKIE", DEFAULT_TOKEN_COOKIE);
        let cookies = get_optional_env("CACAO_COOKIES");
        let storage_dir = PathBuf::from(get_env_or_default("CACAO_STORAGE_DIR", ".cacao"));
        let autosave_secs = get_env_or_default("CACAO_AUTOSAVE_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CACAO_AUTOSAVE_SECS".to_owned(), e.to_string())
            })?;

        Ok(Self {
            server_url,
            token_cookie,
            cookies,
            storage_dir,
            autosave_interval: Duration::from_secs(autosave_secs),
        })
    }
}

/// Parse the server base URL, normalizing to a trailing slash so
/// `Url::join` keeps the full path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("CACAO_SERVER_URL".to_owned(), e.to_string()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("https://shop.example.com/api").expect("valid URL");
        assert_eq!(url.as_str(), "https://shop.example.com/api/");

        let joined = url.join("cart/add/C1/").expect("joins");
        assert_eq!(joined.as_str(), "https://shop.example.com/api/cart/add/C1/");
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("https://shop.example.com/").expect("valid URL");
        assert_eq!(url.as_str(), "https://shop.example.com/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }
}
