//! Fetch configuration.
//!
//! The catalog URL and per-request bound default to production values and
//! can be overridden through environment variables or explicit construction.

use std::time::Duration;

use url::Url;

/// Default parent (catalog) schema location.
pub const DEFAULT_CATALOG_URL: &str = "https://schemas.refcheck.dev/catalog.schema.json";

/// Default bound on a single schema fetch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Configuration for retrieving schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Location of the parent schema listing every entity sub-schema.
    pub catalog_url: Url,
    /// Bound on each fetch, covering connect, headers, and body.
    pub timeout: Duration,
}

impl FetchConfig {
    /// Configuration for `catalog_url` with the default bound.
    pub fn new(catalog_url: Url) -> Self {
        Self {
            catalog_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Replace the per-fetch bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `REFCHECK_CATALOG_URL` (default: [`DEFAULT_CATALOG_URL`])
    /// - `REFCHECK_TIMEOUT_SECS` (default: 5; unparsable values fall back
    ///   to the default)
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog_url = env_url("REFCHECK_CATALOG_URL", DEFAULT_CATALOG_URL)?;
        let timeout_secs = std::env::var("REFCHECK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            catalog_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

/// Parse `raw` as a URL, labelling failures with `source`.
pub fn parse_url(source: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(source.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
