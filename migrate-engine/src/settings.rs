//! Runtime settings for one migration run.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use migrate_core::{Blueprint, MigrationConfig};

use crate::process::CommandSpec;

/// What to do when scratch branches from an earlier run are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleBranchPolicy {
    /// Ask whether to delete them; declining aborts.
    Prompt,
    /// Fail, listing the branches.
    Abort,
    /// Delete them and start over.
    Delete,
    /// Keep them when `source` is already grafted into the application
    /// branch; the source pass is then skipped.
    Resume,
}

impl StaleBranchPolicy {
    /// `Prompt` for interactive runs, `Abort` otherwise.
    pub fn default_for(verbose: bool) -> Self {
        if verbose {
            StaleBranchPolicy::Prompt
        } else {
            StaleBranchPolicy::Abort
        }
    }
}

impl fmt::Display for StaleBranchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StaleBranchPolicy::Prompt => "prompt",
            StaleBranchPolicy::Abort => "abort",
            StaleBranchPolicy::Delete => "delete",
            StaleBranchPolicy::Resume => "resume",
        };
        f.write_str(s)
    }
}

impl FromStr for StaleBranchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prompt" => Ok(Self::Prompt),
            "abort" => Ok(Self::Abort),
            "delete" => Ok(Self::Delete),
            "resume" => Ok(Self::Resume),
            other => Err(format!(
                "unknown stale branch policy '{other}'; expected: prompt, abort, delete, resume"
            )),
        }
    }
}

/// Knobs the caller sets; persisted state lives in the config store instead.
#[derive(Debug, Clone)]
pub struct MigrateSettings {
    /// Ask questions, stream generator output, offer git setup.
    pub verbose: bool,
    /// Pause before each regeneration pass for manual edits.
    pub change_config: bool,
    /// Keep `.jhipster-migrate/` after the run.
    pub keep_config: bool,
    pub skip_install: bool,
    pub stale_branches: StaleBranchPolicy,
    /// Sleep between successive commits so their timestamps differ.
    pub commit_delay: Duration,
    /// Values given on the command line; they replace stored ones.
    pub overrides: MigrationConfig,
    /// Requested `--target-blueprints` entries.
    pub target_blueprints: Vec<Blueprint>,
    /// Default offered for the target version prompt.
    pub default_target_version: Option<String>,
    /// Dependency install run after a clean merge; `None` disables it.
    pub install_command: Option<CommandSpec>,
}

impl Default for MigrateSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            change_config: false,
            keep_config: false,
            skip_install: false,
            stale_branches: StaleBranchPolicy::Abort,
            commit_delay: Duration::from_secs(1),
            overrides: MigrationConfig::default(),
            target_blueprints: Vec::new(),
            default_target_version: None,
            install_command: Some(CommandSpec::new("npm").arg("install")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_round_trips_through_strings() {
        for policy in [
            StaleBranchPolicy::Prompt,
            StaleBranchPolicy::Abort,
            StaleBranchPolicy::Delete,
            StaleBranchPolicy::Resume,
        ] {
            assert_eq!(policy.to_string().parse::<StaleBranchPolicy>().unwrap(), policy);
        }
        assert!("later".parse::<StaleBranchPolicy>().is_err());
    }

    #[test]
    fn interactive_runs_prompt_by_default() {
        assert_eq!(StaleBranchPolicy::default_for(true), StaleBranchPolicy::Prompt);
        assert_eq!(StaleBranchPolicy::default_for(false), StaleBranchPolicy::Abort);
    }
}
