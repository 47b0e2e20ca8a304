//! # refcheck-cli — Catalog-Driven Document Validation
//!
//! Provides the `refcheck` command: validate one local JSON document
//! against the sub-schema its entity type maps to in a remote schema
//! catalog.
//!
//! ```bash
//! refcheck invoice.json
//! refcheck --catalog-url https://schemas.internal/catalog.json -v orders/so-1.json
//! refcheck --format json creditmemo.json
//! refcheck --draft 7 legacy/invoice.json
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | document is valid |
//! | 1 | document violates its schema |
//! | 2 | usage or input error (arguments, unreadable/malformed input, unknown or ambiguous entity type) |
//! | 3 | network or infrastructure error (fetch failure, timeout, schema does not compile) |
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; the pipeline and reporting are
//!   library code so they can be driven from tests.
//! - Schema violations are a normal outcome, never an error value.

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{SchemaDraft, Settings};
pub use pipeline::{Pipeline, PipelineError, PipelineErrorKind, Stage};
pub use report::{ExitStatus, Outcome, OutputFormat, Report};
