//! # Reporting
//!
//! The terminal `Reported` state of a run, its exit status, and its text
//! and JSON renderings.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use refcheck_schema::{EntityType, SchemaLocator, Violation};
use serde_json::{json, Value};

use crate::pipeline::{PipelineError, Stage};

/// Process exit status for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Document conforms.
    Valid = 0,
    /// Document violates its schema.
    Violations = 1,
    /// Bad arguments or bad input document.
    Input = 2,
    /// Network, catalog, or schema failure.
    Infrastructure = 3,
}

impl ExitStatus {
    /// Numeric exit code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Document conforms to its entity schema.
    Valid,
    /// Schema violations, never empty.
    Invalid(Vec<Violation>),
    /// A stage failed before validation could finish.
    Errored(PipelineError),
}

/// Output rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

/// Everything known about a finished run.
#[derive(Debug)]
pub struct Report {
    /// Input path after resolution against the resource directory.
    pub input: PathBuf,
    /// Last stage completed before reporting.
    pub reached: Stage,
    /// Entity type, once resolved.
    pub entity_type: Option<EntityType>,
    /// Sub-schema locator, once resolved.
    pub schema: Option<SchemaLocator>,
    /// How the run ended.
    pub outcome: Outcome,
}

impl Report {
    /// Exit status for this outcome.
    pub fn exit_status(&self) -> ExitStatus {
        match &self.outcome {
            Outcome::Valid => ExitStatus::Valid,
            Outcome::Invalid(_) => ExitStatus::Violations,
            Outcome::Errored(e) => e.kind.exit_status(),
        }
    }

    /// True when the document conforms.
    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, Outcome::Valid)
    }

    /// Violations found, empty unless the outcome is `Invalid`.
    pub fn violations(&self) -> &[Violation] {
        match &self.outcome {
            Outcome::Invalid(v) => v,
            _ => &[],
        }
    }

    /// The pipeline failure, if the run errored.
    pub fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            Outcome::Errored(e) => Some(e),
            _ => None,
        }
    }

    /// Human-readable report.
    pub fn render_text(&self) -> String {
        let input = self.input.display();
        let entity = self
            .entity_type
            .as_ref()
            .map(EntityType::as_str)
            .unwrap_or("unknown");
        let schema = self
            .schema
            .as_ref()
            .map(SchemaLocator::as_str)
            .unwrap_or("-");

        let mut out = String::new();
        match &self.outcome {
            Outcome::Valid => {
                let _ = write!(out, "OK    {input}: valid {entity} document ({schema})");
            }
            Outcome::Invalid(violations) => {
                let _ = write!(
                    out,
                    "FAIL  {input}: {} violation{} against {schema}",
                    violations.len(),
                    if violations.len() == 1 { "" } else { "s" }
                );
                for v in violations {
                    let _ = write!(out, "\n  {v}");
                }
            }
            Outcome::Errored(e) => {
                let _ = write!(out, "ERROR {input}: {e}");
            }
        }
        out
    }

    /// Machine-readable report.
    pub fn to_json(&self) -> Value {
        let (status, errors, error) = match &self.outcome {
            Outcome::Valid => ("valid", Vec::new(), Value::Null),
            Outcome::Invalid(violations) => (
                "invalid",
                violations
                    .iter()
                    .map(|v| {
                        json!({
                            "path": v.dotted_path(),
                            "instance_path": v.instance_path,
                            "schema_path": v.schema_path,
                            "message": v.message,
                        })
                    })
                    .collect(),
                Value::Null,
            ),
            Outcome::Errored(e) => (
                "error",
                Vec::new(),
                json!({"stage": e.stage, "message": e.kind.to_string()}),
            ),
        };

        json!({
            "input": self.input.display().to_string(),
            "entity_type": self.entity_type,
            "schema": self.schema,
            "status": status,
            "reached": self.reached,
            "errors": errors,
            "error": error,
        })
    }
}
