//! # Validation Engine
//!
//! Compiles prepared schemas with the `jsonschema` crate and validates
//! documents against them.
//!
//! ## Offline Compilation
//!
//! Sub-schemas are fetched out-of-band, so the compiler must never reach
//! out to the network on its own. The engine installs a retriever that
//! refuses every external URI: a schema that still contains a cross-document
//! `$ref` fails to compile with a [`SchemaCompileError`] naming the URI,
//! instead of silently blocking on (or skipping) a network fetch.
//!
//! ## Outcomes vs. Errors
//!
//! A document that does not conform is a normal result: [`validate`]
//! returns a [`ValidationOutcome`] with `valid == false`. Only an invalid
//! schema is an error, and that is caught at [`compile`] time.
//!
//! [`validate`]: ValidationEngine::validate
//! [`compile`]: ValidationEngine::compile

use std::fmt;

use jsonschema::{Draft, Retrieve, Uri, ValidationOptions, Validator};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::prepare::PreparedSchema;

/// Retriever that resolves nothing. Every external `$ref` is an error.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!(
            "external reference '{}' cannot be resolved; only the catalog's own references are fetched",
            uri.as_str()
        )
        .into())
    }
}

/// The schema is not valid JSON Schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema does not compile: {reason}")]
pub struct SchemaCompileError {
    /// Compiler diagnostic.
    pub reason: String,
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// The instance path in dotted form: `/invoice/lines/0/id` becomes
    /// `invoice.lines.0.id`. The document root is the empty string.
    pub fn dotted_path(&self) -> String {
        self.instance_path
            .split('/')
            .skip(1)
            .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.dotted_path(), self.message)
        }
    }
}

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// True when the document conforms.
    pub valid: bool,
    /// Violations found; empty iff `valid`.
    pub errors: Vec<Violation>,
}

impl ValidationOutcome {
    fn from_errors(errors: Vec<Violation>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("valid");
        }
        for (i, v) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {v}")?;
        }
        Ok(())
    }
}

/// A compiled schema, reusable across any number of documents.
pub struct CompiledSchema {
    validator: Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}

/// Compiles and applies JSON Schemas.
///
/// Constructed explicitly and passed to whoever needs it; there is no
/// process-wide validator instance.
#[derive(Debug, Clone, Copy)]
pub struct ValidationEngine {
    draft: Draft,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// An engine compiling against JSON Schema Draft 2020-12.
    ///
    /// Prepared schemas have no `$schema` key. The engine draft applies
    /// unless [`compile_prepared`](Self::compile_prepared) is given a schema
    /// that declared a standard draft before it was stripped.
    pub fn new() -> Self {
        Self {
            draft: Draft::Draft202012,
        }
    }

    /// Compile against a different draft.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    /// The draft used when a schema declares none.
    pub fn draft(&self) -> Draft {
        self.draft
    }

    fn build_options(draft: Draft) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(draft);
        opts.with_retriever(OfflineRetriever);
        opts
    }

    /// Compile a schema with the engine draft.
    ///
    /// # Errors
    ///
    /// [`SchemaCompileError`] if the schema is not valid JSON Schema or
    /// contains an external `$ref`.
    pub fn compile(&self, schema: &Value) -> Result<CompiledSchema, SchemaCompileError> {
        Self::compile_with(schema, self.draft)
    }

    /// Compile a prepared schema with the draft it declared, falling back
    /// to the engine draft.
    ///
    /// # Errors
    ///
    /// As [`compile`](Self::compile).
    pub fn compile_prepared(
        &self,
        prepared: &PreparedSchema,
    ) -> Result<CompiledSchema, SchemaCompileError> {
        Self::compile_with(&prepared.schema, prepared.draft.unwrap_or(self.draft))
    }

    fn compile_with(schema: &Value, draft: Draft) -> Result<CompiledSchema, SchemaCompileError> {
        tracing::trace!(?draft, "compiling schema");
        let validator = Self::build_options(draft)
            .build(schema)
            .map_err(|e| SchemaCompileError {
                reason: e.to_string(),
            })?;
        Ok(CompiledSchema { validator })
    }

    /// Validate `document` against a compiled schema. Never fails.
    pub fn validate(&self, compiled: &CompiledSchema, document: &Value) -> ValidationOutcome {
        let errors: Vec<Violation> = compiled
            .validator
            .iter_errors(document)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        ValidationOutcome::from_errors(errors)
    }

    /// Compile `schema` and validate `document` in one step.
    pub fn validate_value(
        &self,
        schema: &Value,
        document: &Value,
    ) -> Result<ValidationOutcome, SchemaCompileError> {
        let compiled = self.compile(schema)?;
        Ok(self.validate(&compiled, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice_schema(id_type: &str) -> Value {
        json!({
            "type": "object",
            "required": ["invoice"],
            "properties": {
                "invoice": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": id_type}}
                }
            }
        })
    }

    #[test]
    fn conforming_document_is_valid() {
        let engine = ValidationEngine::new();
        let outcome = engine
            .validate_value(&invoice_schema("number"), &json!({"invoice": {"id": 1}}))
            .unwrap();
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.to_string(), "valid");
    }

    #[test]
    fn non_conforming_document_reports_path() {
        let engine = ValidationEngine::new();
        let outcome = engine
            .validate_value(&invoice_schema("string"), &json!({"invoice": {"id": 1}}))
            .unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 1);
        let v = &outcome.errors[0];
        assert_eq!(v.instance_path, "/invoice/id");
        assert_eq!(v.dotted_path(), "invoice.id");
        assert!(v.schema_path.ends_with("/type"), "schema path: {}", v.schema_path);
    }

    #[test]
    fn compiled_schema_is_reusable() {
        let engine = ValidationEngine::new();
        let compiled = engine.compile(&invoice_schema("string")).unwrap();
        assert!(engine.validate(&compiled, &json!({"invoice": {"id": "A-1"}})).valid);
        assert!(!engine.validate(&compiled, &json!({"invoice": {"id": 7}})).valid);
        assert!(engine.validate(&compiled, &json!({"invoice": {"id": "A-2"}})).valid);
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        let engine = ValidationEngine::new();
        let err = engine.compile(&json!({"type": 12})).unwrap_err();
        assert!(err.to_string().contains("schema does not compile"));
    }

    #[test]
    fn external_ref_fails_to_compile() {
        let engine = ValidationEngine::new();
        let schema = json!({
            "properties": {"invoice": {"$ref": "https://x/other.json#/properties/invoice"}}
        });
        assert!(engine.compile(&schema).is_err());
    }

    #[test]
    fn local_ref_compiles() {
        let engine = ValidationEngine::new();
        let schema = json!({
            "definitions": {"id": {"type": "string"}},
            "properties": {"id": {"$ref": "#/definitions/id"}}
        });
        let outcome = engine.validate_value(&schema, &json!({"id": 3})).unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].dotted_path(), "id");
    }

    #[test]
    fn draft7_engine_compiles_draft7_keywords() {
        let engine = ValidationEngine::new().with_draft(Draft::Draft7);
        let schema = json!({"items": [{"type": "string"}], "additionalItems": false});
        let outcome = engine.validate_value(&schema, &json!(["a", "b"])).unwrap();
        assert!(!outcome.valid);
    }

    #[test]
    fn declared_draft7_tuple_items_compile_and_validate() {
        let prepared = crate::prepare_with_draft(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "lines": {"items": [{"type": "string"}], "additionalItems": false}
            }
        }));
        let engine = ValidationEngine::new();
        let compiled = engine.compile_prepared(&prepared).unwrap();

        assert!(engine.validate(&compiled, &json!({"lines": ["a"]})).valid);
        let outcome = engine.validate(&compiled, &json!({"lines": ["a", "b"]}));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].dotted_path(), "lines");
    }

    #[test]
    fn undeclared_draft_uses_engine_draft() {
        let prepared = crate::prepare_with_draft(json!({
            "$schema": "https://schemas.invalid/meta/entity.json",
            "items": [{"type": "string"}]
        }));
        assert_eq!(prepared.draft, None);
        assert!(ValidationEngine::new().compile_prepared(&prepared).is_err());
        assert!(ValidationEngine::new()
            .with_draft(Draft::Draft7)
            .compile_prepared(&prepared)
            .is_ok());
    }

    #[test]
    fn dotted_path_unescapes_pointer_segments() {
        let v = Violation {
            instance_path: "/a~1b/c~0d/0".to_string(),
            schema_path: String::new(),
            message: String::new(),
        };
        assert_eq!(v.dotted_path(), "a/b.c~d.0");
    }

    #[test]
    fn violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".to_string(),
            message: r#""invoice" is a required property"#.to_string(),
        };
        assert_eq!(v.dotted_path(), "");
        assert!(v.to_string().starts_with("(root):"));
    }

    #[test]
    fn outcome_display_lists_violations() {
        let outcome = ValidationOutcome::from_errors(vec![
            Violation {
                instance_path: "/invoice/id".to_string(),
                schema_path: "/properties/invoice/properties/id/type".to_string(),
                message: r#"1 is not of type "string""#.to_string(),
            },
            Violation {
                instance_path: "/invoice/total".to_string(),
                schema_path: "/properties/invoice/properties/total/minimum".to_string(),
                message: "-1 is less than the minimum of 0".to_string(),
            },
        ]);
        let text = outcome.to_string();
        assert!(text.contains("invoice.id: 1 is not of type"));
        assert_eq!(text.lines().count(), 2);
    }
}
