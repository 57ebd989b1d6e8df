//! Per-working-tree migration config store.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   .jhipster-migrate/
//!     .gitignore      ("*", keeps the scratch dir out of git)
//!     config.json     (camelCase MigrationConfig)
//! ```
//!
//! # Persistence
//!
//! Every mutating method flushes to disk before returning. Writes are atomic:
//! serialize → `config.json.tmp` sibling → `rename`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, StoreError};
use crate::paths::{config_path, tmp_dir, GITIGNORE};
use crate::types::{Blueprint, BranchSet, MigrationConfig};

/// A loaded migration config bound to the file it persists to.
#[derive(Debug, Clone)]
pub struct MigrationStore {
    path: PathBuf,
    config: MigrationConfig,
    existed: bool,
}

impl MigrationStore {
    /// Load the store under `root`, or start an empty one when absent.
    ///
    /// Nothing is written until the first mutation.
    pub fn open_at(root: &Path) -> Result<Self, StoreError> {
        let path = config_path(root);
        let (config, existed) = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let config = serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
                    path: path.clone(),
                    source: e,
                })?;
                (config, true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => (MigrationConfig::default(), false),
            Err(err) => return Err(io_err(&path, err)),
        };
        Ok(Self {
            path,
            config,
            existed,
        })
    }

    /// `true` when a config file was already present at open time.
    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Set-if-absent for every key in `defaults`; saves only when something changed.
    pub fn defaults(&mut self, defaults: MigrationConfig) -> Result<(), StoreError> {
        if self.config.merge_defaults(defaults) {
            self.save()?;
        }
        Ok(())
    }

    /// Mutate the record and flush it.
    pub fn update(&mut self, f: impl FnOnce(&mut MigrationConfig)) -> Result<(), StoreError> {
        f(&mut self.config);
        self.save()
    }

    pub fn set_branches(&mut self, branches: &BranchSet) -> Result<(), StoreError> {
        branches.validate()?;
        self.update(|cfg| {
            cfg.actual_application_branch = Some(branches.actual.clone());
            cfg.source_application_branch = Some(branches.source.clone());
            cfg.target_application_branch = Some(branches.target.clone());
        })
    }

    pub fn set_blueprints(&mut self, blueprints: Vec<Blueprint>) -> Result<(), StoreError> {
        self.update(|cfg| cfg.blueprints = Some(blueprints))
    }

    /// Atomically write the record to disk, creating the scratch dir if needed.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(dir) = self.path.parent() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("invalid migration config path"),
            ));
        };
        ensure_scratch_dir(dir)?;

        let json = serde_json::to_string_pretty(&self.config)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }
}

/// Remove the whole scratch directory under `root`. Absence is not an error.
pub fn remove_at(root: &Path) -> Result<(), StoreError> {
    let dir = tmp_dir(root);
    match std::fs::remove_dir_all(&dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(dir, err)),
    }
}

fn ensure_scratch_dir(dir: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let ignore = dir.join(GITIGNORE);
    if !ignore.exists() {
        std::fs::write(&ignore, "*\n").map_err(|e| io_err(&ignore, e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
