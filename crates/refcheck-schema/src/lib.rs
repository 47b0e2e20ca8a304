//! # refcheck-schema — Schema Catalog Engine
//!
//! The synchronous half of refcheck. Everything here is a pure function of
//! its inputs (plus the file system, for [`document::load`]); nothing in this
//! crate touches the network.
//!
//! ## Components
//!
//! - [`document`] — load a local JSON document from disk.
//! - [`index`] — scan a parent (catalog) schema for
//!   `"$ref":"<url>#/properties/<key>"` pointers and build a [`RefIndex`].
//! - [`resolve`] — infer the [`EntityType`] of an input document from its
//!   single non-metadata top-level key.
//! - [`prepare`] — strip the `$schema` key from a fetched schema before it
//!   is compiled, remembering the draft it declared.
//! - [`engine`] — compile a prepared schema into a reusable
//!   [`CompiledSchema`] and validate documents against it.
//!
//! ## Why the catalog is indexed as text
//!
//! The validator cannot dereference `$ref`s that point at other
//! network-hosted documents. Instead of structural resolution, the parent
//! schema's references are discovered by a separate indexing pass and each
//! target is fetched and compiled on its own. The resulting [`RefIndex`] is
//! a first-class value, testable without any fetch or validation.
//!
//! ## Crate Policy
//!
//! - No network access. Fetching lives in `refcheck-fetch`.
//! - No global validator state: a [`ValidationEngine`] is an explicit value.
//! - Non-conformance is an [`ValidationOutcome`], never an `Err`.

pub mod document;
pub mod engine;
pub mod index;
pub mod prepare;
pub mod resolve;

pub use jsonschema::Draft;

pub use document::{load, load_str, resolve_path, DocumentError};
pub use engine::{
    CompiledSchema, SchemaCompileError, ValidationEngine, ValidationOutcome, Violation,
};
pub use index::{index, index_text, IndexError, RefIndex, SchemaLocator};
pub use prepare::{draft_for_uri, prepare, prepare_with_draft, PreparedSchema, SCHEMA_KEY};
pub use resolve::{resolve, EntityType, ResolveError};
