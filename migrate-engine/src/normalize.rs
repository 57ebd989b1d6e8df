//! Formatting pass applied to each application before it is committed.
//!
//! The orchestrator only needs `normalize(files) -> mutated files`; what the
//! formatting actually does is up to the [`Normalizer`] implementation.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::digest::file_digest;
use crate::error::MigrateError;
use crate::process::{CommandSpec, IoMode};

/// Extensions picked up by the formatting pass.
pub const FORMATTED_EXTENSIONS: &[&str] = &[
    "md", "json", "yml", "html", "cjs", "mjs", "js", "ts", "tsx", "css", "scss", "vue", "java",
];

/// Files passed to a formatter per invocation.
const CHUNK_SIZE: usize = 200;

/// Formatting collaborator. Must be idempotent over already-normalized files.
pub trait Normalizer {
    /// Normalize `files` (relative to `root`) and return the ones it changed.
    fn normalize(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, MigrateError>;
}

/// Every formattable file under `root`, relative and sorted.
///
/// Honors `.gitignore` and skips hidden entries.
pub fn formatting_file_set(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .parents(false)
        .follow_links(false)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| FORMATTED_EXTENSIONS.contains(&ext))
        })
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

// ---------------------------------------------------------------------------
// Built-in normalizers
// ---------------------------------------------------------------------------

/// Rewrites CRLF line endings to LF.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEndingNormalizer;

impl Normalizer for LineEndingNormalizer {
    fn normalize(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, MigrateError> {
        let mut changed = Vec::new();
        for file in files {
            let path = root.join(file);
            let Ok(contents) = std::fs::read(&path) else {
                tracing::debug!("cannot read {}, skipping", path.display());
                continue;
            };
            if !contents.windows(2).any(|w| w == b"\r\n") {
                continue;
            }
            let mut out = Vec::with_capacity(contents.len());
            let mut iter = contents.iter().peekable();
            while let Some(&byte) = iter.next() {
                if byte == b'\r' && iter.peek() == Some(&&b'\n') {
                    continue;
                }
                out.push(byte);
            }
            std::fs::write(&path, out).map_err(|e| crate::error::io_err(&path, e))?;
            changed.push(file.clone());
        }
        Ok(changed)
    }
}

/// Runs an external formatter, e.g. `npx prettier --write`, over the file
/// set. Formatter failures are logged and ignored.
#[derive(Debug, Clone)]
pub struct CommandNormalizer {
    command: CommandSpec,
}

impl CommandNormalizer {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl Normalizer for CommandNormalizer {
    fn normalize(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, MigrateError> {
        let before: Vec<Option<String>> = files
            .iter()
            .map(|f| file_digest(&root.join(f)).ok())
            .collect();

        for chunk in files.chunks(CHUNK_SIZE) {
            let command = self
                .command
                .clone()
                .args(chunk.iter().map(|f| f.to_string_lossy().into_owned()));
            match command.run(root, IoMode::Silent) {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!("formatter `{}` exited with {status}", self.command),
                Err(err) => {
                    tracing::warn!("{err}");
                    return Ok(Vec::new());
                }
            }
        }

        Ok(files
            .iter()
            .zip(before)
            .filter(|(f, digest)| file_digest(&root.join(f)).ok() != *digest)
            .map(|(f, _)| f.clone())
            .collect())
    }
}
