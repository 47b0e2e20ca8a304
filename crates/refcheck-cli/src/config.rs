//! Run settings: where input documents live and how schemas are fetched.

use std::path::PathBuf;

use refcheck_fetch::{ConfigError, FetchConfig};
use refcheck_schema::Draft;

/// Default directory input paths are resolved against.
pub const DEFAULT_RESOURCE_DIR: &str = "resources";

/// Everything a [`crate::Pipeline`] needs besides the input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Catalog location and fetch bound.
    pub fetch: FetchConfig,
    /// Directory relative input paths are looked up in first.
    pub resource_dir: PathBuf,
    /// Draft for entity schemas whose `$schema` names no standard draft.
    pub draft: Draft,
}

/// JSON Schema drafts selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaDraft {
    /// JSON Schema Draft 4.
    #[value(name = "4")]
    Draft4,
    /// JSON Schema Draft 6.
    #[value(name = "6")]
    Draft6,
    /// JSON Schema Draft 7.
    #[value(name = "7")]
    Draft7,
    /// JSON Schema Draft 2019-09.
    #[value(name = "2019-09")]
    Draft201909,
    /// JSON Schema Draft 2020-12.
    #[value(name = "2020-12")]
    Draft202012,
}

impl From<SchemaDraft> for Draft {
    fn from(draft: SchemaDraft) -> Self {
        match draft {
            SchemaDraft::Draft4 => Draft::Draft4,
            SchemaDraft::Draft6 => Draft::Draft6,
            SchemaDraft::Draft7 => Draft::Draft7,
            SchemaDraft::Draft201909 => Draft::Draft201909,
            SchemaDraft::Draft202012 => Draft::Draft202012,
        }
    }
}

impl Settings {
    /// Settings for `fetch`, with the default resource directory.
    pub fn new(fetch: FetchConfig) -> Self {
        Self {
            fetch,
            resource_dir: PathBuf::from(DEFAULT_RESOURCE_DIR),
            draft: Draft::Draft202012,
        }
    }

    /// Load settings from environment variables.
    ///
    /// Reads the `refcheck-fetch` variables (`REFCHECK_CATALOG_URL`,
    /// `REFCHECK_TIMEOUT_SECS`) plus `REFCHECK_RESOURCE_DIR`
    /// (default: `resources`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let resource_dir = std::env::var_os("REFCHECK_RESOURCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_DIR));
        Ok(Self {
            resource_dir,
            ..Self::new(FetchConfig::from_env()?)
        })
    }
}
