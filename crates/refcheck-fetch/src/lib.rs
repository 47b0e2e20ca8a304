//! # refcheck-fetch — Schema Retrieval
//!
//! Retrieves the parent (catalog) schema and entity sub-schemas over HTTP.
//! The validator never dereferences a schema URL itself; every schema it
//! compiles arrives through [`SchemaFetcher`].
//!
//! ## Timeout & Retry
//!
//! Each fetch is bounded by [`FetchConfig::timeout`] (default 5s), covering
//! connect, headers, and body. A fetch that exceeds the bound is cancelled
//! and reported as [`FetchCause::Timeout`]. There is no retry: one failed
//! fetch ends the run.
//!
//! ## Locators
//!
//! Catalog references carry a fragment (`...json#/properties/invoice`).
//! The fragment names a location inside the document and is dropped before
//! the request is sent; the whole document is returned.

pub mod config;
pub mod error;

pub use config::{ConfigError, FetchConfig, DEFAULT_CATALOG_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{FetchCause, SchemaFetchError};

use std::time::Duration;

use refcheck_schema::SchemaLocator;
use serde_json::Value;
use url::Url;

/// HTTP client for schema documents.
#[derive(Debug, Clone)]
pub struct SchemaFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl SchemaFetcher {
    /// Build a fetcher whose requests are bounded by `config.timeout`.
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static(
                        "application/schema+json, application/json",
                    ),
                );
                headers
            })
            .build()?;
        Ok(Self {
            http,
            timeout: config.timeout,
        })
    }

    /// The bound applied to each fetch.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retrieve and parse the schema document at `locator`.
    ///
    /// # Errors
    ///
    /// [`SchemaFetchError`] carrying the locator and a [`FetchCause`]:
    /// invalid locator, timeout, transport failure, non-2xx status, or a
    /// body that is not JSON.
    pub async fn fetch(&self, locator: &SchemaLocator) -> Result<Value, SchemaFetchError> {
        let url = request_url(locator).map_err(|reason| {
            SchemaFetchError::new(locator.as_str(), FetchCause::InvalidLocator(reason))
        })?;

        tracing::debug!(%url, "fetching schema");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(locator, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            tracing::warn!(%locator, status, "schema fetch returned non-success status");
            let body = resp
                .text()
                .await
                .map_err(|e| self.transport_error(locator, e))?;
            return Err(SchemaFetchError::new(
                locator.as_str(),
                FetchCause::Status {
                    status,
                    body: error::body_excerpt(body),
                },
            ));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(locator, e))?;

        let schema: Value = serde_json::from_slice(&bytes)
            .map_err(|e| SchemaFetchError::new(locator.as_str(), FetchCause::Decode(e)))?;

        tracing::debug!(%locator, bytes = bytes.len(), "fetched schema");
        Ok(schema)
    }

    /// Strip compiler-incompatible metadata (`$schema`) from a fetched
    /// schema. Idempotent.
    pub fn prepare(schema: Value) -> Value {
        refcheck_schema::prepare(schema)
    }

    /// [`fetch`](Self::fetch) followed by [`prepare`](Self::prepare).
    pub async fn fetch_prepared(&self, locator: &SchemaLocator) -> Result<Value, SchemaFetchError> {
        self.fetch(locator).await.map(Self::prepare)
    }

    fn transport_error(&self, locator: &SchemaLocator, e: reqwest::Error) -> SchemaFetchError {
        let cause = if e.is_timeout() {
            FetchCause::Timeout {
                after: self.timeout,
            }
        } else {
            FetchCause::Transport(e)
        };
        SchemaFetchError::new(locator.as_str(), cause)
    }
}

/// The URL to request for `locator`: http(s) only, fragment removed.
fn request_url(locator: &SchemaLocator) -> Result<Url, String> {
    let mut url = Url::parse(locator.as_str()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    url.set_fragment(None);
    Ok(url)
}
