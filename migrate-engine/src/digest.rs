//! SHA-256 digests of files and whole regenerated trees.

use std::path::Path;

use ignore::WalkBuilder;
use sha2::{Digest, Sha256};

use migrate_core::paths::{GIT_DIR, MIGRATE_TMP_FOLDER};

use crate::error::{io_err, MigrateError};

/// Hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String, MigrateError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(sha256_hex(&bytes))
}

/// Digest over every non-ignored file under `root`, outside `.git` and the
/// scratch directory.
///
/// Paths are visited in sorted order and fed to the hash together with the
/// file contents, so two trees digest equal exactly when they hold the same
/// files with the same bytes.
pub fn tree_digest(root: &Path) -> Result<String, MigrateError> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .parents(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let name = entry.file_name();
            name != GIT_DIR && name != MIGRATE_TMP_FOLDER
        })
        .build();

    let mut hasher = Sha256::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let contents = std::fs::read(path).map_err(|e| io_err(path, e))?;
        hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update([0u8]);
        hasher.update(&contents);
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}
