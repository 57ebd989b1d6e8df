//! Error types for migrate-engine.

use std::path::PathBuf;

use thiserror::Error;

use migrate_core::StoreError;
use migrate_detector::DetectError;

/// All errors that can arise while orchestrating a migration.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// An error from the migration config store.
    #[error("config store error: {0}")]
    Store(#[from] StoreError),

    /// The working tree is not a usable generated application.
    #[error("{0}")]
    Detect(#[from] DetectError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `git` could not be run at all.
    #[error("git is not available ({reason}); install git: https://git-scm.com/")]
    GitNotFound { reason: String },

    /// A git invocation exited unsuccessfully.
    #[error("`{command}` failed ({}): {stderr}", exit_label(.status))]
    Git {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The tree has uncommitted changes; nothing has been touched.
    #[error(
        "local changes found; please commit/stash them before migrating\n\t{}",
        .files.join("\n\t")
    )]
    DirtyTree { files: Vec<String> },

    /// Scratch branches from an earlier run exist and were not cleared.
    #[error(
        "migration branches from a previous run exist: {}; delete them or re-run with --stale-branches delete|resume",
        .branches.join(", ")
    )]
    StaleBranches { branches: Vec<String> },

    /// The run was started from one of the scratch branches.
    #[error("'{branch}' is a migration branch; check out your application branch first")]
    OnScratchBranch { branch: String },

    /// HEAD is not on a branch, so there is nothing to merge back into.
    #[error("HEAD is detached; check out your application branch first")]
    DetachedHead,

    /// A `current` selector could not be resolved to any version.
    #[error("cannot resolve the current generator version for the {pass} application")]
    UnresolvedVersion { pass: String },

    /// A process could not be spawned.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The generator exited unsuccessfully; nothing was committed for the pass.
    #[error(
        "regenerating the {pass} application with JHipster {version} failed: `{command}` {}",
        exit_label(.status)
    )]
    Generation {
        pass: String,
        version: String,
        command: String,
        status: Option<i32>,
    },

    /// A merge that must never conflict did.
    #[error("unexpected conflicts merging '{branch}': {}", .files.join(", "))]
    UnexpectedConflict { branch: String, files: Vec<String> },

    /// A step ran before the step that sets up its state.
    #[error("internal error: '{0}' must run before this step")]
    StepOrder(&'static str),

    /// Interactive input failed or was aborted.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Convenience constructor for [`MigrateError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> MigrateError {
    MigrateError::Io {
        path: path.into(),
        source,
    }
}
