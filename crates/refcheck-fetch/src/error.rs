//! Schema fetch error types.

use std::time::Duration;

/// Longest response body excerpt kept in an error.
const BODY_EXCERPT_LEN: usize = 512;

/// A schema document could not be retrieved.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch schema {locator}: {cause}")]
pub struct SchemaFetchError {
    /// The locator that was requested.
    pub locator: String,
    /// What went wrong.
    #[source]
    pub cause: FetchCause,
}

impl SchemaFetchError {
    pub(crate) fn new(locator: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            locator: locator.into(),
            cause,
        }
    }

    /// True when the fetch exceeded its bound.
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FetchCause::Timeout { .. })
    }
}

/// Why a schema fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchCause {
    /// The locator is not an http(s) URL.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),
    /// No complete response within the bound. The request was cancelled.
    #[error("timed out after {after:?}")]
    Timeout { after: Duration },
    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body is not JSON.
    #[error("response is not JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

pub(crate) fn body_excerpt(mut body: String) -> String {
    if body.len() > BODY_EXCERPT_LEN {
        let mut cut = BODY_EXCERPT_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
