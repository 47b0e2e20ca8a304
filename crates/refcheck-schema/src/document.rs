//! # Document Loading
//!
//! Reads a local JSON document and parses it into a [`serde_json::Value`].
//! The only side effect is the file read.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Error loading a local JSON document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file is absent or unreadable.
    #[error("cannot read '{path}': {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The content is not well-formed JSON.
    #[error("invalid JSON in '{path}': {source}")]
    Parse {
        /// Path (or other origin label) of the text.
        path: String,
        /// Underlying parse failure, with line and column.
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    /// The path or origin label the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Load and parse the JSON document at `path`.
///
/// # Errors
///
/// [`DocumentError::Read`] if the file cannot be read,
/// [`DocumentError::Parse`] if it is not valid JSON.
pub fn load(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    load_str(&content, &path.display().to_string())
}

/// Parse JSON text that came from `origin` (a path, URL, or label).
pub fn load_str(text: &str, origin: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(text).map_err(|e| DocumentError::Parse {
        path: origin.to_string(),
        source: e,
    })
}

/// Resolve an input path against the configured resource directory.
///
/// Absolute paths are returned as-is. A relative path is joined onto
/// `resource_dir` when that file exists; otherwise it is returned unchanged
/// and interpreted relative to the current directory.
pub fn resolve_path(path: &Path, resource_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let in_resources = resource_dir.join(path);
    if in_resources.exists() {
        in_resources
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_parses_object() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("invoice.json");
        std::fs::write(&file, br#"{"invoice":{"id":1}}"#).unwrap();

        let doc = load(&file).unwrap();
        assert_eq!(doc["invoice"]["id"], 1);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }), "got {err}");
        assert!(err.path().ends_with("absent.json"));
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        std::fs::write(&file, b"{\"invoice\": ").unwrap();

        let err = load(&file).unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }), "got {err}");
    }

    #[test]
    fn load_str_labels_origin() {
        let err = load_str("not json", "https://x/invoice.json").unwrap_err();
        assert_eq!(err.path(), "https://x/invoice.json");
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn resolve_path_absolute_returned_as_is() {
        let result = resolve_path(Path::new("/abs/input.json"), Path::new("/res"));
        assert_eq!(result, PathBuf::from("/abs/input.json"));
    }

    #[test]
    fn resolve_path_prefers_resource_dir_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("order.json"), b"{}").unwrap();

        let result = resolve_path(Path::new("order.json"), dir.path());
        assert_eq!(result, dir.path().join("order.json"));
    }

    #[test]
    fn resolve_path_falls_back_to_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_path(Path::new("missing.json"), dir.path());
        assert_eq!(result, PathBuf::from("missing.json"));
    }
}
