//! Migration state machine.
//!
//! Every step is a plain function over [`Migration`]; [`crate::pipeline`]
//! groups them into ordered phases and runs them. Steps only communicate
//! through the working tree, the config store and the fields below.
//!
//! Branch topology produced by a full run:
//!
//! ```text
//! source (orphan):  S1 ── S2 ──────── S3
//!                          \            \ (ours)
//! actual:   A0 ── A1 ───────\─────────── M1 ─────── M2
//!                            \                    /
//! target:                     T1 ── T2 ──────────
//! ```
//!
//! `S1` regenerates the old version, `S2`/`A1` apply formatting, `S3` holds
//! the actual tree on top of the orphan history, `M1` records `source` as an
//! ancestor of `actual` without changing its tree, `T1`/`T2` regenerate and
//! format the new version, `M2` is the three-way merge back.

use std::path::PathBuf;

use semver::Version;

use migrate_core::{
    blueprint::merge_target_blueprints,
    paths::{
        ACTUAL_APPLICATION, BASE_APPLICATION, DEFAULT_CLI, GIT_VERSION_ALLOW_UNRELATED_HISTORIES,
        MIGRATE_SOURCE_BRANCH, MIGRATE_TARGET_BRANCH, TARGET_APPLICATION,
    },
    store, BranchSet, MigrationConfig, MigrationStore, ResolvedConfig, VersionSelector,
};
use migrate_detector::{detect_project, DetectedProject};

use crate::cleanup::clean_up;
use crate::error::MigrateError;
use crate::generator::{Generator, Pass};
use crate::git_setup;
use crate::normalize::{formatting_file_set, Normalizer};
use crate::process::IoMode;
use crate::prompt::Prompter;
use crate::regenerate::{commit_all, regenerate, RegenerationPass, COMMIT_FLAGS};
use crate::settings::{MigrateSettings, StaleBranchPolicy};
use crate::vcs::{MergeOutcome, Vcs};

/// External capabilities a run drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub vcs: &'a dyn Vcs,
    pub generator: &'a dyn Generator,
    pub normalizer: &'a dyn Normalizer,
    pub prompter: &'a dyn Prompter,
}

/// Mutable context threaded through every step of one run.
pub struct Migration<'a> {
    pub root: PathBuf,
    pub settings: MigrateSettings,
    tools: Collaborators<'a>,
    store: Option<MigrationStore>,
    project: Option<DetectedProject>,
    git_version: Option<Version>,
    /// Unresolved paths left by the merge-back.
    pub conflicts: Vec<String>,
    /// The merge-back stopped on conflicts.
    pub merge_failed: bool,
    pub installed: bool,
    pub config_removed: bool,
}

impl<'a> Migration<'a> {
    pub fn new(root: impl Into<PathBuf>, settings: MigrateSettings, tools: Collaborators<'a>) -> Self {
        Self {
            root: root.into(),
            settings,
            tools,
            store: None,
            project: None,
            git_version: None,
            conflicts: Vec::new(),
            merge_failed: false,
            installed: false,
            config_removed: false,
        }
    }

    fn vcs(&self) -> &'a dyn Vcs {
        self.tools.vcs
    }

    fn io(&self) -> IoMode {
        if self.settings.verbose {
            IoMode::Inherit
        } else {
            IoMode::Silent
        }
    }

    fn store_mut(&mut self) -> Result<&mut MigrationStore, MigrateError> {
        self.store.as_mut().ok_or(MigrateError::StepOrder("create_config"))
    }

    fn project(&self) -> Result<&DetectedProject, MigrateError> {
        self.project.as_ref().ok_or(MigrateError::StepOrder("assert_project"))
    }

    /// Fully populated view of the stored config.
    pub fn config(&self) -> Result<ResolvedConfig, MigrateError> {
        let store = self.store.as_ref().ok_or(MigrateError::StepOrder("create_config"))?;
        Ok(store.config().resolve()?)
    }

    /// Branch names once `detect_current_branch` has run.
    pub fn branches(&self) -> Option<BranchSet> {
        let cfg = self.store.as_ref()?.config();
        Some(BranchSet {
            actual: cfg.actual_application_branch.clone()?,
            source: cfg.source_application_branch.clone()?,
            target: cfg.target_application_branch.clone()?,
        })
    }

    fn pause_between_commits(&self) {
        if !self.settings.commit_delay.is_zero() {
            std::thread::sleep(self.settings.commit_delay);
        }
    }

    fn should_pause(&self) -> bool {
        self.settings.verbose || self.settings.change_config
    }

    fn supports_unrelated_histories(&self) -> bool {
        match (&self.git_version, Version::parse(GIT_VERSION_ALLOW_UNRELATED_HISTORIES)) {
            (Some(installed), Ok(minimum)) => *installed >= minimum,
            _ => false,
        }
    }

    /// Format the current tree and commit as `apply updated formatting to <label> application`.
    fn apply_formatting(&self, label: &str) -> Result<(), MigrateError> {
        let files = formatting_file_set(&self.root);
        let changed = self.tools.normalizer.normalize(&self.root, &files)?;
        tracing::debug!(
            "formatting {label} application changed {} of {} files",
            changed.len(),
            files.len()
        );
        commit_all(
            self.vcs(),
            &format!("apply updated formatting to {label} application"),
        )
    }
}

// ---------------------------------------------------------------------------
// initializing
// ---------------------------------------------------------------------------

pub fn display_banner(_m: &mut Migration<'_>) -> Result<(), MigrateError> {
    tracing::info!("Welcome to the JHipster migrate tool");
    tracing::info!("This will help migrate your current application codebase");
    Ok(())
}

pub fn assert_project(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let project = detect_project(&m.root)?;
    tracing::debug!("migrating application '{}'", project.base_name);
    m.project = Some(project);
    Ok(())
}

pub fn assert_git_present(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let version = m.vcs().version()?;
    tracing::debug!("using git {version}");
    m.git_version = Some(version);
    Ok(())
}

/// Open the store and apply command-line overrides.
pub fn create_config(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let mut store = MigrationStore::open_at(&m.root)?;
    if store.existed() {
        tracing::info!("continuing with migration config at {}", store.path().display());
    }
    let overrides = m.settings.overrides.clone();
    if overrides != MigrationConfig::default() {
        store.update(|cfg| cfg.apply_overrides(overrides))?;
    }
    m.store = Some(store);
    Ok(())
}

/// Fill absent keys and fold `--target-blueprints` into the blueprint list.
pub fn set_defaults(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let recorded = m.project()?.blueprints.clone();
    let requested = m.settings.target_blueprints.clone();
    let store = m.store_mut()?;
    store.defaults(MigrationConfig {
        source_cli: Some(DEFAULT_CLI.to_string()),
        target_cli: Some(DEFAULT_CLI.to_string()),
        source_version: Some(VersionSelector::Current),
        target_version: Some(VersionSelector::Bundled),
        blueprints: Some(recorded),
        ..Default::default()
    })?;

    if !requested.is_empty() {
        let mut blueprints = store.config().blueprints.clone().unwrap_or_default();
        merge_target_blueprints(&mut blueprints, requested);
        store.set_blueprints(blueprints)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// prompting
// ---------------------------------------------------------------------------

/// Ask for every tool setting, defaulting to what is stored. Verbose only.
pub fn prompting(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    if !m.settings.verbose {
        return Ok(());
    }
    let prompter = m.tools.prompter;
    let detected = m.project()?.current_source_version().map(str::to_string);
    let latest = m.settings.default_target_version.clone();
    let stored = m.store_mut()?.config().clone();

    // Symbolic defaults are shown as the concrete versions they stand for.
    let source_default = match (&stored.source_version, detected) {
        (Some(VersionSelector::Current), Some(version)) => Some(version),
        (stored, _) => stored.as_ref().map(ToString::to_string),
    };
    let target_default = match (&stored.target_version, latest) {
        (Some(VersionSelector::Bundled), Some(version)) => Some(version),
        (stored, _) => stored.as_ref().map(ToString::to_string),
    };

    let ask = |message: &str, default: Option<String>| -> Result<Option<String>, MigrateError> {
        let answer = prompter.input(message, default.as_deref().unwrap_or(""))?;
        Ok(Some(answer.trim().to_string()).filter(|a| !a.is_empty()))
    };
    let ask_version = |message: &str, default: Option<String>| -> Result<Option<VersionSelector>, MigrateError> {
        ask(message, default)?
            .map(|v| v.parse::<VersionSelector>().map_err(MigrateError::from))
            .transpose()
    };

    let answers = MigrationConfig {
        source_cli: ask(
            "Executable to use to generate the source application",
            stored.source_cli.clone(),
        )?,
        target_cli: ask(
            "Executable used to generate the target application",
            stored.target_cli.clone(),
        )?,
        source_version: ask_version(
            "JHipster version to use to generate the source application",
            source_default,
        )?,
        target_version: ask_version(
            "JHipster version to use to generate the target application",
            target_default,
        )?,
        source_cli_options: ask(
            "Executable options to generate the source application",
            stored.source_cli_options.clone(),
        )?,
        target_cli_options: ask(
            "Executable options to generate the target application",
            stored.target_cli_options.clone(),
        )?,
        ..Default::default()
    };
    m.store_mut()?.update(|cfg| cfg.apply_overrides(answers))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// configuring
// ---------------------------------------------------------------------------

/// Initialise a repository with one `initial` commit when the tree is not one.
pub fn assert_git_repository(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let vcs = m.vcs();
    if !vcs.check_is_repo()? {
        tracing::info!("initializing git repository");
        vcs.init()?;
        vcs.add(&["."])?;
        vcs.commit("initial", COMMIT_FLAGS)?;
    }
    Ok(())
}

pub fn assert_no_local_changes(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let status = m.vcs().status()?;
    if !status.is_empty() {
        return Err(MigrateError::DirtyTree {
            files: status
                .iter()
                .map(|entry| format!("{} {}", entry.index, entry.path))
                .collect(),
        });
    }
    Ok(())
}

pub fn setup_three_way_diff(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    if m.settings.verbose {
        git_setup::setup_three_way_diff(m.vcs(), m.tools.prompter)?;
    }
    Ok(())
}

pub fn setup_package_json_driver(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    if !m.settings.verbose {
        return Ok(());
    }
    match dirs::home_dir() {
        Some(home) => {
            git_setup::setup_package_json_driver(m.vcs(), m.tools.prompter, &home)?;
        }
        None => tracing::warn!("could not determine home directory; skipping merge driver setup"),
    }
    Ok(())
}

/// Record the checked-out branch as `actual` alongside the scratch branch names.
pub fn detect_current_branch(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let current = m.vcs().current_branch()?;
    if current == "HEAD" {
        return Err(MigrateError::DetachedHead);
    }
    if current == MIGRATE_SOURCE_BRANCH || current == MIGRATE_TARGET_BRANCH {
        return Err(MigrateError::OnScratchBranch { branch: current });
    }
    let branches = BranchSet {
        actual: current,
        source: MIGRATE_SOURCE_BRANCH.to_string(),
        target: MIGRATE_TARGET_BRANCH.to_string(),
    };
    tracing::info!("migrating branch '{}'", branches.actual);
    m.store_mut()?.set_branches(&branches)?;
    Ok(())
}

/// Apply the [`StaleBranchPolicy`] to scratch branches left by an earlier run.
pub fn check_stale_branches(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let vcs = m.vcs();
    let branches = m.config()?.branches;
    let mut stale = Vec::new();
    for name in branches.scratch() {
        if vcs.branch_exists(name)? {
            stale.push(name.to_string());
        }
    }
    if stale.is_empty() {
        return Ok(());
    }

    let delete = match m.settings.stale_branches {
        StaleBranchPolicy::Abort => false,
        StaleBranchPolicy::Delete => true,
        StaleBranchPolicy::Resume
            if stale.len() == branches.scratch().len()
                && vcs.is_ancestor(&branches.source, &branches.actual)? =>
        {
            tracing::info!("resuming with existing branches {}", stale.join(", "));
            return Ok(());
        }
        StaleBranchPolicy::Resume => false,
        StaleBranchPolicy::Prompt => m.tools.prompter.confirm(
            &format!(
                "Migration branches from a previous run exist ({}). Delete them?",
                stale.join(", ")
            ),
            false,
        )?,
    };
    if !delete {
        return Err(MigrateError::StaleBranches { branches: stale });
    }
    for name in &stale {
        vcs.delete_local_branch(name, true)?;
        tracing::info!("deleted stale branch {name}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// preparing
// ---------------------------------------------------------------------------

/// Build the orphan `source` branch and graft it into `actual`'s history.
///
/// Skipped when `source` already exists.
pub fn prepare_migrate_branch(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let vcs = m.vcs();
    let cfg = m.config()?;
    let BranchSet {
        actual,
        source,
        target,
    } = &cfg.branches;

    if vcs.branch_exists(source)? {
        tracing::info!("branch {source} already exists, skipping source regeneration");
        return Ok(());
    }

    vcs.checkout(&["--orphan", source.as_str()])?;
    tracing::info!("created branch {source}");
    clean_up(&m.root)?;

    if m.should_pause() {
        m.tools.prompter.pause(&format!(
            "We are about to start generating the application using JHipster version {}. You can customize your environment now. Continue?",
            cfg.source_version
        ))?;
    }

    let pass = RegenerationPass {
        pass: Pass::Source,
        cli: &cfg.source_cli,
        version: &cfg.source_version,
        blueprints: cfg.source_blueprints(),
        options: &cfg.source_cli_options,
    };
    regenerate(&m.root, vcs, m.tools.generator, &pass, m.io())?;

    m.pause_between_commits();
    m.apply_formatting(BASE_APPLICATION)?;
    vcs.checkout_local_branch(target)?;
    tracing::info!("created branch {target}");

    m.pause_between_commits();
    vcs.checkout(&[actual.as_str()])?;
    m.apply_formatting(ACTUAL_APPLICATION)?;

    // Same tree as `actual`, history rooted in the orphan branch.
    m.pause_between_commits();
    vcs.checkout(&[source.as_str()])?;
    vcs.raw(&["read-tree", "--reset", "-u", actual.as_str()])?;
    commit_all(
        vcs,
        &format!("apply {ACTUAL_APPLICATION} application to migration branch"),
    )?;

    m.pause_between_commits();
    vcs.checkout(&[actual.as_str()])?;
    let message = format!("initial merge of {source} branch into application");
    let mut args = vec!["--strategy", "ours", "--no-edit", "-m", message.as_str()];
    if m.supports_unrelated_histories() {
        args.push("--allow-unrelated-histories");
    }
    args.push(source.as_str());
    match vcs.merge(&args)? {
        MergeOutcome::Merged => {
            tracing::info!("merged {source} into {actual}");
            Ok(())
        }
        MergeOutcome::Conflicted { files } => Err(MigrateError::UnexpectedConflict {
            branch: source.clone(),
            files,
        }),
    }
}

// ---------------------------------------------------------------------------
// default
// ---------------------------------------------------------------------------

pub fn generate_with_target_version(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let vcs = m.vcs();
    let cfg = m.config()?;

    vcs.checkout(&[cfg.branches.target.as_str()])?;
    clean_up(&m.root)?;

    if m.should_pause() {
        m.tools
            .prompter
            .pause("You can change application configuration now. Continue?")?;
    }

    let pass = RegenerationPass {
        pass: Pass::Target,
        cli: &cfg.target_cli,
        version: &cfg.target_version,
        blueprints: cfg.target_blueprints(),
        options: &cfg.target_cli_options,
    };
    regenerate(&m.root, vcs, m.tools.generator, &pass, m.io())?;

    m.pause_between_commits();
    m.apply_formatting(TARGET_APPLICATION)
}

// ---------------------------------------------------------------------------
// writing
// ---------------------------------------------------------------------------

/// Three-way merge `target` into `actual`. Conflicts are recorded, not raised.
pub fn merge_changes_back(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let vcs = m.vcs();
    let branches = m.config()?.branches;
    tracing::info!("merging changes back to {}", branches.actual);

    vcs.checkout(&["-f", branches.actual.as_str()])?;
    let message = format!("merging {} into application", branches.target);
    match vcs.merge(&["--no-edit", "-m", message.as_str(), branches.target.as_str()])? {
        MergeOutcome::Merged => {
            vcs.reset_hard(None)?;
            tracing::info!("migration patch applied");
        }
        MergeOutcome::Conflicted { files } => {
            tracing::warn!("merge of {} stopped with {} conflicts", branches.target, files.len());
            m.conflicts = files;
            m.merge_failed = true;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// post writing / install / end
// ---------------------------------------------------------------------------

pub fn remove_migration_config(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    if m.settings.keep_config {
        return Ok(());
    }
    store::remove_at(&m.root)?;
    m.config_removed = true;
    Ok(())
}

/// Install dependencies after a clean merge. Failures degrade to a warning.
pub fn install(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    if m.settings.skip_install || m.merge_failed {
        return Ok(());
    }
    let Some(command) = m.settings.install_command.clone() else {
        return Ok(());
    };
    tracing::info!("installing dependencies, please wait...");
    match command.run(&m.root, m.io()) {
        Ok(status) if status.success() => m.installed = true,
        Ok(status) => tracing::warn!("`{command}` exited with {status}; skipping install"),
        Err(err) => tracing::warn!("{err}; skipping install"),
    }
    Ok(())
}

pub fn end(m: &mut Migration<'_>) -> Result<(), MigrateError> {
    let unmerged = m.vcs().unmerged_paths()?;
    if !unmerged.is_empty() {
        m.conflicts = unmerged;
    }
    tracing::info!("migrated successfully");
    if !m.conflicts.is_empty() {
        tracing::warn!(
            "please fix conflicts listed below and commit!\n{}",
            m.conflicts.join("\n")
        );
    }
    Ok(())
}
