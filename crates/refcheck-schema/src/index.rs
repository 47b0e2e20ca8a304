//! # Catalog Indexing
//!
//! Builds a [`RefIndex`] (entity-type key → schema locator) from a parent
//! schema whose only job is to list per-entity sub-schemas via `$ref`.
//!
//! The parent is serialized to compact JSON and scanned once, left to right,
//! for the shape
//!
//! ```text
//! "$ref":"<url>#/properties/<key>"
//! ```
//!
//! Only the parent's own references are indexed; fetched sub-schemas are
//! never scanned. When a key occurs more than once the last occurrence in
//! the serialized text wins and the key is recorded in
//! [`RefIndex::duplicates`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// `"$ref":"<url>#/properties/<key>"` in compact serde_json output.
static PROPERTY_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##""\$ref":"([^"#]+)#/properties/([^"/]+)""##)
        .expect("property $ref pattern is a valid regex")
});

/// Where a schema document can be fetched from. Opaque to the validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaLocator(String);

impl SchemaLocator {
    /// Wrap a locator string.
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaLocator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SchemaLocator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Error building a [`RefIndex`].
#[derive(Error, Debug)]
pub enum IndexError {
    /// The parent schema could not be serialized to text for scanning.
    #[error("cannot serialize parent schema for indexing: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Mapping from entity-type key to the sub-schema that validates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefIndex {
    entries: BTreeMap<String, SchemaLocator>,
    duplicates: BTreeSet<String>,
}

impl RefIndex {
    /// Number of distinct entity-type keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the parent contained no matching references.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the locator for an entity-type key.
    pub fn get(&self, key: &str) -> Option<&SchemaLocator> {
        self.entries.get(key)
    }

    /// All indexed keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Iterate `(key, locator)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaLocator)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys that appeared more than once; their earlier locators were
    /// overwritten.
    pub fn duplicates(&self) -> impl Iterator<Item = &str> {
        self.duplicates.iter().map(String::as_str)
    }

    fn insert(&mut self, key: &str, locator: &str) {
        let previous = self
            .entries
            .insert(key.to_string(), SchemaLocator::new(locator));
        if let Some(previous) = previous {
            tracing::warn!(
                key,
                overwritten = %previous,
                locator,
                "entity type referenced more than once in catalog; last reference wins"
            );
            self.duplicates.insert(key.to_string());
        }
    }
}

/// Index a parent schema document.
///
/// # Errors
///
/// [`IndexError::Serialize`] only if the value cannot be rendered as JSON
/// text, which does not happen for values produced by `serde_json`.
pub fn index(parent: &Value) -> Result<RefIndex, IndexError> {
    let text = serde_json::to_string(parent)?;
    Ok(index_text(&text))
}

/// Scan compact JSON text for property references.
pub fn index_text(text: &str) -> RefIndex {
    let mut index = RefIndex::default();
    for caps in PROPERTY_REF_PATTERN.captures_iter(text) {
        index.insert(&caps[2], &caps[1]);
    }
    tracing::debug!(entries = index.len(), "indexed catalog references");
    index
}
