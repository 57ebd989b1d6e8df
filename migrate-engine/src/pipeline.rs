//! Shared migration pipeline entrypoint.
//!
//! A run is an ordered list of named phases, each an ordered list of named
//! steps. The driver runs them in declaration order and stops at the first
//! error; there is no rollback, every phase boundary is a restart point.

use std::path::Path;

use serde::Serialize;

use crate::error::MigrateError;
use crate::orchestrator::{self as steps, Collaborators, Migration};
use crate::settings::MigrateSettings;

/// A named step.
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub run: fn(&mut Migration<'_>) -> Result<(), MigrateError>,
}

/// A named group of steps.
#[derive(Clone)]
pub struct Phase {
    pub name: &'static str,
    pub steps: Vec<Step>,
}

macro_rules! phase {
    ($name:literal => [$($step:ident),* $(,)?]) => {
        Phase {
            name: $name,
            steps: vec![$(Step { name: stringify!($step), run: steps::$step }),*],
        }
    };
}

/// Every phase of a migration, in execution order.
pub fn phases() -> Vec<Phase> {
    vec![
        phase!("initializing" => [
            display_banner,
            assert_project,
            assert_git_present,
            create_config,
            set_defaults,
        ]),
        phase!("prompting" => [prompting]),
        phase!("configuring" => [
            assert_git_repository,
            assert_no_local_changes,
            setup_three_way_diff,
            setup_package_json_driver,
            detect_current_branch,
            check_stale_branches,
        ]),
        phase!("preparing" => [prepare_migrate_branch]),
        phase!("default" => [generate_with_target_version]),
        phase!("writing" => [merge_changes_back]),
        phase!("post_writing" => [remove_migration_config]),
        phase!("install" => [install]),
        phase!("end" => [end]),
    ]
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub actual: String,
    pub source: String,
    pub target: String,
    /// Paths left with conflict markers; empty on a clean merge.
    pub conflicts: Vec<String>,
    pub installed: bool,
    pub config_removed: bool,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Run the full migration for the working tree at `root`.
///
/// Conflicts left by the final merge are reported in the result, not as an
/// error.
pub fn run(
    root: &Path,
    settings: MigrateSettings,
    tools: Collaborators<'_>,
) -> Result<MigrationReport, MigrateError> {
    let mut migration = Migration::new(root, settings, tools);
    run_phases(&mut migration, &phases())?;

    let branches = migration
        .branches()
        .ok_or(MigrateError::StepOrder("detect_current_branch"))?;
    Ok(MigrationReport {
        actual: branches.actual,
        source: branches.source,
        target: branches.target,
        conflicts: migration.conflicts,
        installed: migration.installed,
        config_removed: migration.config_removed,
    })
}

/// Drive `phases` over `migration`, stopping at the first failing step.
pub fn run_phases(migration: &mut Migration<'_>, phases: &[Phase]) -> Result<(), MigrateError> {
    for phase in phases {
        tracing::debug!("phase {}", phase.name);
        for step in &phase.steps {
            tracing::debug!("step {}::{}", phase.name, step.name);
            (step.run)(migration).inspect_err(|err| {
                tracing::error!("{}::{} failed: {err}", phase.name, step.name);
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_run_in_lifecycle_order() {
        let names: Vec<_> = phases().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "initializing",
                "prompting",
                "configuring",
                "preparing",
                "default",
                "writing",
                "post_writing",
                "install",
                "end",
            ]
        );
    }

    #[test]
    fn dirty_check_precedes_branch_work() {
        let all: Vec<_> = phases()
            .iter()
            .flat_map(|p| p.steps.iter().map(|s| s.name).collect::<Vec<_>>())
            .collect();
        let position = |name: &str| all.iter().position(|s| *s == name).unwrap();
        assert!(position("assert_no_local_changes") < position("detect_current_branch"));
        assert!(position("check_stale_branches") < position("prepare_migrate_branch"));
        assert!(position("merge_changes_back") < position("remove_migration_config"));
    }
}
