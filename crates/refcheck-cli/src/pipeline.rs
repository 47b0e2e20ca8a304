//! # Validation Pipeline
//!
//! Drives one input document through the catalog flow:
//!
//! ```text
//! Start → InputLoaded → ParentFetched → Indexed → TypeResolved
//!       → SubSchemaFetched → SchemaPrepared → Compiled → Reported
//! ```
//!
//! Stages run strictly in order and each consumes the previous stage's
//! output. The first failure short-circuits to `Reported` carrying the
//! stage that could not be reached and the originating error. There is no
//! retry and no partial validation.
//!
//! The input is loaded before any network activity, and the sub-schema is
//! only fetched once the entity type has both resolved and been found in
//! the catalog index.

use std::fmt;
use std::path::{Path, PathBuf};

use refcheck_fetch::{ConfigError, SchemaFetchError, SchemaFetcher};
use refcheck_schema::{
    CompiledSchema, DocumentError, EntityType, IndexError, PreparedSchema, RefIndex,
    ResolveError, SchemaCompileError, SchemaLocator, ValidationEngine, ValidationOutcome,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;
use crate::report::{ExitStatus, Outcome, Report};

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing done yet.
    Start,
    /// Input document read and parsed.
    InputLoaded,
    /// Catalog schema retrieved.
    ParentFetched,
    /// Catalog `$ref`s indexed by entity type.
    Indexed,
    /// Entity type resolved and found in the index.
    TypeResolved,
    /// Entity schema retrieved.
    SubSchemaFetched,
    /// `$schema` stripped from the entity schema.
    SchemaPrepared,
    /// Entity schema compiled.
    Compiled,
    /// Outcome reported. Terminal.
    Reported,
}

impl Stage {
    /// What the pipeline is doing while trying to reach this stage.
    pub fn activity(self) -> &'static str {
        match self {
            Self::Start => "starting",
            Self::InputLoaded => "loading input document",
            Self::ParentFetched => "fetching schema catalog",
            Self::Indexed => "indexing schema catalog",
            Self::TypeResolved => "resolving entity type",
            Self::SubSchemaFetched => "fetching entity schema",
            Self::SchemaPrepared => "preparing entity schema",
            Self::Compiled => "compiling entity schema",
            Self::Reported => "reporting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.activity())
    }
}

/// What went wrong in a failed stage.
#[derive(Error, Debug)]
pub enum PipelineErrorKind {
    /// Input unreadable or not JSON.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Catalog or entity schema could not be fetched.
    #[error(transparent)]
    Fetch(#[from] SchemaFetchError),

    /// Catalog could not be indexed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Input does not name exactly one entity type.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Input's entity type has no entry in the catalog.
    #[error("entity type '{entity_type}' is not in the schema catalog (known: {})", known_types(.known))]
    UnknownEntityType {
        /// The resolved entity type.
        entity_type: String,
        /// Entity types the catalog does list.
        known: Vec<String>,
    },

    /// The entity schema is not valid JSON Schema.
    #[error(transparent)]
    Compile(#[from] SchemaCompileError),
}

fn known_types(known: &[String]) -> String {
    if known.is_empty() {
        "none".to_string()
    } else {
        known.join(", ")
    }
}

impl PipelineErrorKind {
    /// Input problems map to exit code 2, infrastructure problems to 3.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Document(_) | Self::Resolve(_) | Self::UnknownEntityType { .. } => {
                ExitStatus::Input
            }
            Self::Fetch(_) | Self::Index(_) | Self::Compile(_) => ExitStatus::Infrastructure,
        }
    }
}

/// A stage failure.
#[derive(Error, Debug)]
#[error("{stage} failed: {kind}")]
pub struct PipelineError {
    /// The stage the pipeline was trying to reach.
    pub stage: Stage,
    /// The originating error.
    #[source]
    pub kind: PipelineErrorKind,
}

impl PipelineError {
    fn at(stage: Stage, kind: impl Into<PipelineErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }
}

/// The input document after [`Stage::InputLoaded`].
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// Resolved path the document was read from.
    pub path: PathBuf,
    /// Parsed document.
    pub document: Value,
}

/// Output of [`Stage::TypeResolved`]: the entity type and its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// The input's single top-level key.
    pub entity_type: EntityType,
    /// Where the catalog says that type's schema lives.
    pub locator: SchemaLocator,
}

/// What a run has established so far, carried into the [`Report`].
#[derive(Debug)]
struct Progress {
    reached: Stage,
    entity_type: Option<EntityType>,
    schema: Option<SchemaLocator>,
}

/// One configured validation pipeline. Holds no per-run state; each
/// [`run`](Self::run) starts from [`Stage::Start`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: SchemaFetcher,
    engine: ValidationEngine,
    catalog: SchemaLocator,
    resource_dir: PathBuf,
}

impl Pipeline {
    /// Build a pipeline from settings.
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(
            SchemaFetcher::new(&settings.fetch)?,
            ValidationEngine::new().with_draft(settings.draft),
            SchemaLocator::new(settings.fetch.catalog_url.as_str()),
            settings.resource_dir.clone(),
        ))
    }

    /// Assemble a pipeline from explicit collaborators.
    pub fn from_parts(
        fetcher: SchemaFetcher,
        engine: ValidationEngine,
        catalog: SchemaLocator,
        resource_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            engine,
            catalog,
            resource_dir,
        }
    }

    /// Location of the parent schema.
    pub fn catalog(&self) -> &SchemaLocator {
        &self.catalog
    }

    /// Where `path` is read from: relative paths are looked up in the
    /// resource directory first.
    pub fn input_path(&self, path: &Path) -> PathBuf {
        refcheck_schema::resolve_path(path, &self.resource_dir)
    }

    /// `Start → InputLoaded`. `path` is read as given; see
    /// [`input_path`](Self::input_path).
    pub fn load_input(&self, path: &Path) -> Result<LoadedInput, PipelineError> {
        let document = refcheck_schema::load(path)
            .map_err(|e| PipelineError::at(Stage::InputLoaded, e))?;
        Ok(LoadedInput {
            path: path.to_path_buf(),
            document,
        })
    }

    /// `InputLoaded → ParentFetched`.
    pub async fn fetch_parent(&self) -> Result<Value, PipelineError> {
        self.fetcher
            .fetch(&self.catalog)
            .await
            .map_err(|e| PipelineError::at(Stage::ParentFetched, e))
    }

    /// `ParentFetched → Indexed`.
    pub fn index(&self, parent: &Value) -> Result<RefIndex, PipelineError> {
        let index = refcheck_schema::index(parent)
            .map_err(|e| PipelineError::at(Stage::Indexed, e))?;
        if index.is_empty() {
            tracing::warn!(catalog = %self.catalog, "schema catalog lists no entity types");
        }
        Ok(index)
    }

    /// `Indexed → TypeResolved`: classify the input and look it up.
    pub fn resolve_type(
        &self,
        input: &LoadedInput,
        index: &RefIndex,
    ) -> Result<ResolvedType, PipelineError> {
        let entity_type = refcheck_schema::resolve(&input.document)
            .map_err(|e| PipelineError::at(Stage::TypeResolved, e))?;
        let locator = index.get(entity_type.as_str()).cloned().ok_or_else(|| {
            PipelineError::at(
                Stage::TypeResolved,
                PipelineErrorKind::UnknownEntityType {
                    entity_type: entity_type.to_string(),
                    known: index.keys().into_iter().map(str::to_string).collect(),
                },
            )
        })?;
        Ok(ResolvedType {
            entity_type,
            locator,
        })
    }

    /// `TypeResolved → SubSchemaFetched`.
    pub async fn fetch_sub_schema(&self, resolved: &ResolvedType) -> Result<Value, PipelineError> {
        self.fetcher
            .fetch(&resolved.locator)
            .await
            .map_err(|e| PipelineError::at(Stage::SubSchemaFetched, e))
    }

    /// `SubSchemaFetched → SchemaPrepared`: strip `$schema`, keeping the
    /// draft it declared.
    pub fn prepare(&self, schema: Value) -> PreparedSchema {
        refcheck_schema::prepare_with_draft(schema)
    }

    /// `SchemaPrepared → Compiled`, with the schema's declared draft or
    /// else the configured one.
    pub fn compile(&self, schema: &PreparedSchema) -> Result<CompiledSchema, PipelineError> {
        self.engine
            .compile_prepared(schema)
            .map_err(|e| PipelineError::at(Stage::Compiled, e))
    }

    /// `Compiled → Reported`: apply the compiled schema to the input.
    pub fn check(&self, compiled: &CompiledSchema, input: &LoadedInput) -> ValidationOutcome {
        self.engine.validate(compiled, &input.document)
    }

    /// Run every stage for `input_path` and report the terminal state.
    pub async fn run(&self, input_path: &Path) -> Report {
        let mut progress = Progress {
            reached: Stage::Start,
            entity_type: None,
            schema: None,
        };
        let input = self.input_path(input_path);

        let outcome = match self.drive(&input, &mut progress).await {
            Ok(outcome) if outcome.valid => {
                tracing::info!(input = %input.display(), "document is valid");
                Outcome::Valid
            }
            Ok(outcome) => {
                tracing::info!(
                    input = %input.display(),
                    violations = outcome.errors.len(),
                    "document violates its schema"
                );
                Outcome::Invalid(outcome.errors)
            }
            Err(e) => {
                tracing::info!(input = %input.display(), stage = ?e.stage, "pipeline failed: {e}");
                Outcome::Errored(e)
            }
        };

        Report {
            input,
            reached: progress.reached,
            entity_type: progress.entity_type,
            schema: progress.schema,
            outcome,
        }
    }

    async fn drive(
        &self,
        input: &Path,
        progress: &mut Progress,
    ) -> Result<ValidationOutcome, PipelineError> {
        let input = self.load_input(input)?;
        advance(progress, Stage::InputLoaded);

        let parent = self.fetch_parent().await?;
        advance(progress, Stage::ParentFetched);

        let index = self.index(&parent)?;
        advance(progress, Stage::Indexed);

        let resolved = self.resolve_type(&input, &index)?;
        progress.entity_type = Some(resolved.entity_type.clone());
        progress.schema = Some(resolved.locator.clone());
        advance(progress, Stage::TypeResolved);

        let schema = self.fetch_sub_schema(&resolved).await?;
        advance(progress, Stage::SubSchemaFetched);

        let schema = self.prepare(schema);
        advance(progress, Stage::SchemaPrepared);

        let compiled = self.compile(&schema)?;
        advance(progress, Stage::Compiled);

        Ok(self.check(&compiled, &input))
    }
}

fn advance(progress: &mut Progress, stage: Stage) {
    tracing::debug!(from = ?progress.reached, to = ?stage, "stage complete");
    progress.reached = stage;
}
