//! Metadata stripping for fetched schemas.
//!
//! The validator treats `$schema` as a meta-schema pointer it must resolve,
//! and catalog schemas point it at network-only URIs. The key is removed
//! before compilation. When it names one of the standard meta-schemas, the
//! draft it declares is kept alongside the stripped schema so the engine
//! compiles with the right keyword semantics.

use jsonschema::Draft;
use serde_json::Value;

/// The metadata key stripped from schemas and ignored by type resolution.
pub const SCHEMA_KEY: &str = "$schema";

/// A schema ready to compile: `$schema` removed, declared draft retained.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSchema {
    /// The schema without its top-level `$schema` key.
    pub schema: Value,
    /// Draft named by the removed `$schema`, if it was a standard
    /// meta-schema URI.
    pub draft: Option<Draft>,
}

/// The draft named by a meta-schema URI.
///
/// Accepts the published draft-04 through 2020-12 URIs, over http or https,
/// with or without the empty fragment. Anything else is `None`.
pub fn draft_for_uri(uri: &str) -> Option<Draft> {
    let uri = uri.trim_end_matches('#');
    let path = uri
        .strip_prefix("http://")
        .or_else(|| uri.strip_prefix("https://"))?;
    match path {
        "json-schema.org/draft-04/schema" => Some(Draft::Draft4),
        "json-schema.org/draft-06/schema" => Some(Draft::Draft6),
        "json-schema.org/draft-07/schema" => Some(Draft::Draft7),
        "json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
        "json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
        _ => None,
    }
}

/// Strip the top-level `$schema` key, keeping the draft it declared.
pub fn prepare_with_draft(mut schema: Value) -> PreparedSchema {
    let declared = schema
        .as_object_mut()
        .and_then(|obj| obj.remove(SCHEMA_KEY));
    let draft = match declared.as_ref().and_then(Value::as_str) {
        Some(uri) => {
            let draft = draft_for_uri(uri);
            if draft.is_none() {
                tracing::debug!(uri, "$schema is not a standard meta-schema; using engine draft");
            }
            draft
        }
        None => None,
    };
    if declared.is_some() {
        tracing::trace!(?draft, "stripped $schema from fetched schema");
    }
    PreparedSchema { schema, draft }
}

/// Remove the top-level `$schema` key. Idempotent; non-objects pass through.
pub fn prepare(schema: Value) -> Value {
    prepare_with_draft(schema).schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn removes_top_level_schema_key() {
        let schema = json!({
            "$schema": "https://x/meta.json",
            "type": "object",
            "properties": {"nested": {"$schema": "kept"}}
        });
        let prepared = prepare(schema);
        assert!(prepared.get(SCHEMA_KEY).is_none());
        assert_eq!(prepared["type"], "object");
        assert_eq!(prepared["properties"]["nested"]["$schema"], "kept");
    }

    #[test]
    fn schema_without_key_is_unchanged() {
        let schema = json!({"type": "string"});
        assert_eq!(prepare(schema.clone()), schema);
    }

    #[test]
    fn boolean_schema_passes_through() {
        assert_eq!(prepare(json!(true)), json!(true));
    }

    #[test]
    fn standard_meta_schema_uris_map_to_drafts() {
        assert_eq!(
            draft_for_uri("http://json-schema.org/draft-07/schema#"),
            Some(Draft::Draft7)
        );
        assert_eq!(
            draft_for_uri("https://json-schema.org/draft-04/schema"),
            Some(Draft::Draft4)
        );
        assert_eq!(
            draft_for_uri("http://json-schema.org/draft-06/schema#"),
            Some(Draft::Draft6)
        );
        assert_eq!(
            draft_for_uri("https://json-schema.org/draft/2019-09/schema"),
            Some(Draft::Draft201909)
        );
        assert_eq!(
            draft_for_uri("https://json-schema.org/draft/2020-12/schema"),
            Some(Draft::Draft202012)
        );
    }

    #[test]
    fn unknown_meta_schema_uri_has_no_draft() {
        assert_eq!(draft_for_uri("https://schemas.invalid/meta/entity.json"), None);
        assert_eq!(draft_for_uri("json-schema.org/draft-07/schema"), None);
        assert_eq!(draft_for_uri(""), None);
    }

    #[test]
    fn prepare_with_draft_keeps_declared_draft() {
        let prepared = prepare_with_draft(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "array"
        }));
        assert_eq!(prepared.draft, Some(Draft::Draft7));
        assert_eq!(prepared.schema, json!({"type": "array"}));
    }

    #[test]
    fn prepare_with_draft_without_key_has_no_draft() {
        let prepared = prepare_with_draft(json!({"type": "string"}));
        assert_eq!(prepared.draft, None);
        let prepared = prepare_with_draft(json!({"$schema": 7, "type": "string"}));
        assert_eq!(prepared.draft, None);
        assert_eq!(prepared.schema, json!({"type": "string"}));
    }

    proptest! {
        #[test]
        fn prepare_is_idempotent(
            props in prop::collection::btree_map("[a-z$]{1,8}", "[a-z]{0,8}", 0..8),
            with_schema in any::<bool>(),
        ) {
            let mut obj: serde_json::Map<String, Value> =
                props.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
            if with_schema {
                obj.insert(SCHEMA_KEY.to_string(), json!("https://x/meta.json"));
            }
            let once = prepare(Value::Object(obj));
            let twice = prepare(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
