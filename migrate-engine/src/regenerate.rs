//! One regeneration pass: invoke the generator, drop non-reproducible
//! artifacts, commit everything outside the scratch directory.

use std::path::Path;

use migrate_core::{
    paths::{exclude_tmp_pathspec, DEFAULT_CLI_OPTIONS, KEYSTORE_ARTIFACT},
    Blueprint, VersionSelector,
};
use migrate_detector::strip_tool_version;

use crate::cleanup::remove_quietly;
use crate::digest::tree_digest;
use crate::error::MigrateError;
use crate::generator::{GenerateRequest, Generator, Pass};
use crate::process::IoMode;
use crate::vcs::Vcs;

/// Flags on every commit the orchestrator makes.
pub const COMMIT_FLAGS: &[&str] = &["--allow-empty", "--no-verify"];

/// Parameters of a single pass.
#[derive(Debug, Clone)]
pub struct RegenerationPass<'a> {
    pub pass: Pass,
    pub cli: &'a str,
    pub version: &'a VersionSelector,
    pub blueprints: Vec<Blueprint>,
    /// User-supplied options; the default option set is appended.
    pub options: &'a [String],
}

impl RegenerationPass<'_> {
    /// `migration application generated with jhipster 8.1.0 and bp@1.0.0 (target)`
    pub fn commit_message(&self) -> String {
        let blueprints = if self.blueprints.is_empty() {
            String::new()
        } else {
            let list: Vec<String> = self
                .blueprints
                .iter()
                .map(|bp| bp.package_spec(bp.version.as_deref()))
                .collect();
            format!(" and {}", list.join(", "))
        };
        format!(
            "migration application generated with {} {}{} ({})",
            self.cli, self.version, blueprints, self.pass
        )
    }

    fn args(&self) -> Vec<String> {
        self.options
            .iter()
            .cloned()
            .chain(DEFAULT_CLI_OPTIONS.split_whitespace().map(str::to_string))
            .collect()
    }
}

/// Stage all changes except the scratch directory and commit them.
pub fn commit_all(vcs: &dyn Vcs, message: &str) -> Result<(), MigrateError> {
    let exclude = exclude_tmp_pathspec();
    vcs.add(&[".", exclude.as_str()])?;
    vcs.commit(message, COMMIT_FLAGS)
}

/// Run one pass against the cleaned tree at `root` and commit the result.
///
/// Nothing is committed when the generator fails.
pub fn regenerate(
    root: &Path,
    vcs: &dyn Vcs,
    generator: &dyn Generator,
    pass: &RegenerationPass<'_>,
    io: IoMode,
) -> Result<String, MigrateError> {
    tracing::info!("regenerating {} application", pass.pass);

    if pass.pass == Pass::Target && strip_tool_version(root)? {
        tracing::debug!("removed recorded generator version before the target pass");
    }

    let request = GenerateRequest {
        pass: pass.pass,
        cli: pass.cli.to_string(),
        version: pass.version.clone(),
        blueprints: pass.blueprints.clone(),
        args: pass.args(),
        io,
    };
    generator.invoke(root, &request)?;

    remove_quietly(&root.join(KEYSTORE_ARTIFACT));

    let message = pass.commit_message();
    commit_all(vcs, &message)?;
    tracing::info!("successfully regenerated {} application", pass.pass);
    if tracing::log_enabled!(tracing::Level::Debug) {
        match tree_digest(root) {
            Ok(digest) => tracing::debug!("{} tree digest {digest}", pass.pass),
            Err(err) => tracing::debug!("could not digest {} tree: {err}", pass.pass),
        }
    }
    Ok(message)
}
