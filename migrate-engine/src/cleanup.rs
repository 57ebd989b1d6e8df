//! Pre-regeneration cleanup of the working tree.
//!
//! Every top-level entry is deleted unless it is on the fixed allow-list
//! (project config, `.gitignore`, generator cache, npm manifest/lock/modules,
//! `.git`, the migration scratch dir) or matched by the tree's `.gitignore`. Entries are
//! processed in sorted order; failed deletions are logged and skipped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use migrate_core::paths::{CLEANUP_ALLOW_LIST, GITIGNORE};

use crate::error::{io_err, MigrateError};

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Top-level entries removed, sorted.
    pub removed: Vec<PathBuf>,
    /// Top-level entries left in place, sorted.
    pub kept: Vec<PathBuf>,
}

/// Load the root `.gitignore`; a missing file yields an empty matcher.
pub fn ignore_matcher(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let path = root.join(GITIGNORE);
    if path.exists() {
        if let Some(err) = builder.add(&path) {
            tracing::warn!("ignoring unreadable patterns in {}: {err}", path.display());
        }
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!("invalid .gitignore at {}: {err}", path.display());
        Gitignore::empty()
    })
}

/// `true` when the top-level entry `name` survives cleanup.
pub fn is_kept(name: &str, is_dir: bool, matcher: &Gitignore) -> bool {
    CLEANUP_ALLOW_LIST.contains(&name) || matcher.matched(name, is_dir).is_ignore()
}

/// Compute which top-level entries a cleanup pass would remove. No I/O
/// beyond listing the directory and reading `.gitignore`.
pub fn plan(root: &Path) -> Result<CleanupReport, MigrateError> {
    let matcher = ignore_matcher(root);
    let mut entries: Vec<_> = std::fs::read_dir(root)
        .map_err(|e| io_err(root, e))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut report = CleanupReport::default();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_kept(&name, is_dir, &matcher) {
            report.kept.push(entry.path());
        } else {
            report.removed.push(entry.path());
        }
    }
    Ok(report)
}

/// Remove every generated top-level entry under `root`.
pub fn clean_up(root: &Path) -> Result<CleanupReport, MigrateError> {
    let report = plan(root)?;
    for path in &report.removed {
        remove_quietly(path);
    }
    tracing::info!(
        "cleaned up project directory ({} removed, {} kept)",
        report.removed.len(),
        report.kept.len()
    );
    Ok(report)
}

/// `rm -rf` that never fails; an already-absent path is not worth a warning.
pub fn remove_quietly(path: &Path) {
    let result = match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => tracing::debug!("removed {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("could not remove {}: {err}", path.display()),
    }
}
