//! Version-control driver.
//!
//! [`Vcs`] is the capability the orchestrator drives; [`Git`] implements it
//! by shelling out to the `git` binary in the working tree. Every call is
//! blocking and runs to completion.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use semver::Version;

use crate::error::MigrateError;

/// One line of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index (staged) status letter; `?` for untracked.
    pub index: char,
    /// Working-tree status letter.
    pub worktree: char,
    pub path: String,
}

/// Result of a merge that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merge committed cleanly.
    Merged,
    /// Merge stopped with unresolved paths left in the tree.
    Conflicted { files: Vec<String> },
}

/// Operations the orchestrator needs from version control.
pub trait Vcs {
    /// Installed tool version.
    fn version(&self) -> Result<Version, MigrateError>;
    fn status(&self) -> Result<Vec<StatusEntry>, MigrateError>;
    fn check_is_repo(&self) -> Result<bool, MigrateError>;
    fn init(&self) -> Result<(), MigrateError>;
    /// `git checkout <args…>`, e.g. `["-f", "main"]` or `["--orphan", "x"]`.
    fn checkout(&self, args: &[&str]) -> Result<(), MigrateError>;
    /// Create `name` from HEAD and switch to it.
    fn checkout_local_branch(&self, name: &str) -> Result<(), MigrateError>;
    /// Stage additions, modifications and deletions for `pathspecs`.
    fn add(&self, pathspecs: &[&str]) -> Result<(), MigrateError>;
    fn commit(&self, message: &str, flags: &[&str]) -> Result<(), MigrateError>;
    /// Conflicts are an outcome, not an error.
    fn merge(&self, args: &[&str]) -> Result<MergeOutcome, MigrateError>;
    /// `git reset --hard [target]`.
    fn reset_hard(&self, target: Option<&str>) -> Result<(), MigrateError>;
    fn revparse(&self, args: &[&str]) -> Result<String, MigrateError>;
    fn delete_local_branch(&self, name: &str, force: bool) -> Result<(), MigrateError>;
    fn get_config(&self, key: &str) -> Result<Option<String>, MigrateError>;
    fn add_config(&self, key: &str, value: &str, global: bool) -> Result<(), MigrateError>;
    /// Run arbitrary arguments and return trimmed stdout.
    fn raw(&self, args: &[&str]) -> Result<String, MigrateError>;

    fn current_branch(&self) -> Result<String, MigrateError> {
        self.revparse(&["--abbrev-ref", "HEAD"])
    }

    fn branch_exists(&self, name: &str) -> Result<bool, MigrateError> {
        let reference = format!("refs/heads/{name}");
        match self.revparse(&["--verify", "--quiet", &reference]) {
            Ok(_) => Ok(true),
            Err(MigrateError::Git { .. }) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// `true` when `ancestor` is reachable from `descendant`.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, MigrateError> {
        match self.raw(&["merge-base", "--is-ancestor", ancestor, descendant]) {
            Ok(_) => Ok(true),
            Err(MigrateError::Git {
                status: Some(1), ..
            }) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Paths with unresolved merge conflicts.
    fn unmerged_paths(&self) -> Result<Vec<String>, MigrateError> {
        let out = self.raw(&["diff", "--name-only", "--diff-filter=U"])?;
        Ok(out.lines().map(str::to_string).collect())
    }
}

// ---------------------------------------------------------------------------
// git CLI implementation
// ---------------------------------------------------------------------------

/// [`Vcs`] backed by the `git` executable, rooted at a working tree.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
    program: String,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            program: "git".to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.root)
            .env("LANG", "en")
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn output(&self, args: &[&str]) -> Result<Output, MigrateError> {
        tracing::debug!("git {}", args.join(" "));
        self.command(args).output().map_err(|e| MigrateError::GitNotFound {
            reason: e.to_string(),
        })
    }

    /// Run and require success; returns trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String, MigrateError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(git_failure(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

fn git_failure(args: &[&str], output: &Output) -> MigrateError {
    let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
    }
    MigrateError::Git {
        command: format!("git {}", args.join(" ")),
        status: output.status.code(),
        stderr,
    }
}

/// Extract `x.y.z` from `git version 2.43.0 (Apple Git-115)`-style output.
pub fn parse_git_version(raw: &str) -> Option<Version> {
    raw.split_whitespace().find_map(|word| {
        let numeric: Vec<&str> = word.split('.').take(3).collect();
        let all_digits = numeric
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if numeric.len() < 3 || !all_digits {
            return None;
        }
        Version::parse(&numeric.join(".")).ok()
    })
}

impl Vcs for Git {
    fn version(&self) -> Result<Version, MigrateError> {
        let raw = self.run(&["--version"])?;
        parse_git_version(&raw).ok_or_else(|| MigrateError::GitNotFound {
            reason: format!("unrecognised version output '{raw}'"),
        })
    }

    fn status(&self) -> Result<Vec<StatusEntry>, MigrateError> {
        let out = self.run(&["status", "--porcelain", "--untracked-files=all"])?;
        Ok(out
            .lines()
            .filter(|line| line.len() > 3)
            .map(|line| {
                let mut chars = line.chars();
                let index = chars.next().unwrap_or(' ');
                let worktree = chars.next().unwrap_or(' ');
                StatusEntry {
                    index,
                    worktree,
                    path: line[3..].to_string(),
                }
            })
            .collect())
    }

    fn check_is_repo(&self) -> Result<bool, MigrateError> {
        let output = self.output(&["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    fn init(&self) -> Result<(), MigrateError> {
        self.run(&["init"]).map(drop)
    }

    fn checkout(&self, args: &[&str]) -> Result<(), MigrateError> {
        let mut full = vec!["checkout"];
        full.extend_from_slice(args);
        self.run(&full).map(drop)
    }

    fn checkout_local_branch(&self, name: &str) -> Result<(), MigrateError> {
        self.run(&["checkout", "-b", name]).map(drop)
    }

    fn add(&self, pathspecs: &[&str]) -> Result<(), MigrateError> {
        let mut full = vec!["add", "-A", "--"];
        full.extend_from_slice(pathspecs);
        self.run(&full).map(drop)
    }

    fn commit(&self, message: &str, flags: &[&str]) -> Result<(), MigrateError> {
        let mut full = vec!["commit", "-m", message];
        full.extend_from_slice(flags);
        self.run(&full).map(drop)
    }

    fn merge(&self, args: &[&str]) -> Result<MergeOutcome, MigrateError> {
        let mut full = vec!["merge"];
        full.extend_from_slice(args);
        let output = self.output(&full)?;
        if output.status.success() {
            return Ok(MergeOutcome::Merged);
        }
        let files = self.unmerged_paths()?;
        if files.is_empty() {
            return Err(git_failure(&full, &output));
        }
        Ok(MergeOutcome::Conflicted { files })
    }

    fn reset_hard(&self, target: Option<&str>) -> Result<(), MigrateError> {
        let mut full = vec!["reset", "--hard"];
        full.extend(target);
        self.run(&full).map(drop)
    }

    fn revparse(&self, args: &[&str]) -> Result<String, MigrateError> {
        let mut full = vec!["rev-parse"];
        full.extend_from_slice(args);
        self.run(&full)
    }

    fn delete_local_branch(&self, name: &str, force: bool) -> Result<(), MigrateError> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, name]).map(drop)
    }

    fn get_config(&self, key: &str) -> Result<Option<String>, MigrateError> {
        let output = self.output(&["config", "--get", key])?;
        // Exit status 1 means the key is unset.
        match output.status.code() {
            Some(0) => {
                let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Ok(Some(value).filter(|v| !v.is_empty()))
            }
            Some(1) => Ok(None),
            _ => Err(git_failure(&["config", "--get", key], &output)),
        }
    }

    fn add_config(&self, key: &str, value: &str, global: bool) -> Result<(), MigrateError> {
        if global {
            self.run(&["config", "--global", key, value]).map(drop)
        } else {
            self.run(&["config", key, value]).map(drop)
        }
    }

    fn raw(&self, args: &[&str]) -> Result<String, MigrateError> {
        self.run(args)
    }
}
