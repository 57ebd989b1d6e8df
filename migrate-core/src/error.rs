//! Error types for migrate-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from config store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write/save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on load: includes the file path.
    #[error("failed to parse migration config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A version selector that is neither symbolic nor a semantic version.
    #[error("invalid version selector '{0}'; expected current, bundled, none or a semantic version")]
    InvalidVersion(String),

    /// A required key is absent after defaults were applied.
    #[error("migration config is missing '{0}'")]
    MissingKey(&'static str),

    /// Two of the three branch names coincide.
    #[error("branch names must be distinct (actual: {actual}, source: {source_branch}, target: {target})")]
    BranchCollision {
        actual: String,
        source_branch: String,
        target: String,
    },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
