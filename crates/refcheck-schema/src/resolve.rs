//! # Entity-Type Resolution
//!
//! An input document declares its entity type by having exactly one
//! top-level key (ignoring the `$schema` metadata key), e.g.
//! `{"invoice": {...}}` is an `invoice`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::prepare::SCHEMA_KEY;

/// The entity type an input document declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// The entity-type key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error resolving an input document's entity type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Zero, or more than one, candidate top-level key.
    #[error("{}", describe_candidates(.candidates))]
    AmbiguousOrMissingEntity {
        /// Top-level keys other than `$schema`, in document order.
        candidates: Vec<String>,
    },

    /// The document is not a JSON object, so it has no top-level keys.
    #[error("input document must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type name of the document.
        found: &'static str,
    },
}

fn describe_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "input document has no entity-type key".to_string()
    } else {
        format!(
            "input document has {} top-level keys ({}); expected exactly one entity type",
            candidates.len(),
            candidates.join(", ")
        )
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Infer the entity type of `document`.
///
/// # Errors
///
/// [`ResolveError::AmbiguousOrMissingEntity`] unless exactly one
/// non-`$schema` key is present; [`ResolveError::NotAnObject`] for
/// non-object documents.
pub fn resolve(document: &Value) -> Result<EntityType, ResolveError> {
    let obj = document.as_object().ok_or(ResolveError::NotAnObject {
        found: type_name(document),
    })?;

    let mut candidates: Vec<String> = obj
        .keys()
        .filter(|k| k.as_str() != SCHEMA_KEY)
        .cloned()
        .collect();

    if candidates.len() == 1 {
        Ok(EntityType(candidates.remove(0)))
    } else {
        Err(ResolveError::AmbiguousOrMissingEntity { candidates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_key_is_entity_type() {
        let ty = resolve(&json!({"invoice": {"id": 1}})).unwrap();
        assert_eq!(ty.as_str(), "invoice");
    }

    #[test]
    fn schema_key_is_ignored() {
        let doc = json!({"$schema": "https://x/catalog.json", "salesorder": {}});
        assert_eq!(resolve(&doc).unwrap().to_string(), "salesorder");
    }

    #[test]
    fn two_keys_are_ambiguous() {
        let err = resolve(&json!({"invoice": {}, "creditmemo": {}})).unwrap_err();
        match err {
            ResolveError::AmbiguousOrMissingEntity { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.contains(&"invoice".to_string()));
                assert!(candidates.contains(&"creditmemo".to_string()));
            }
            other => panic!("expected AmbiguousOrMissingEntity, got {other:?}"),
        }
    }

    #[test]
    fn empty_object_is_missing() {
        let err = resolve(&json!({})).unwrap_err();
        assert_eq!(
            err,
            ResolveError::AmbiguousOrMissingEntity { candidates: vec![] }
        );
        assert!(err.to_string().contains("no entity-type key"));
    }

    #[test]
    fn only_schema_key_is_missing() {
        let err = resolve(&json!({"$schema": "x"})).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousOrMissingEntity { ref candidates } if candidates.is_empty()));
    }

    #[test]
    fn array_is_not_an_object() {
        let err = resolve(&json!([{"invoice": {}}])).unwrap_err();
        assert_eq!(err, ResolveError::NotAnObject { found: "array" });
    }
}
