//! Domain types for the migration config record.
//!
//! The persisted record ([`MigrationConfig`]) keeps every key optional so the
//! store can apply set-if-absent defaults; [`ResolvedConfig`] is the fully
//! populated view the orchestrator works with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::paths::LEGACY_MAJOR_BOUNDARY;

// ---------------------------------------------------------------------------
// Version selector
// ---------------------------------------------------------------------------

/// Which generator version a regeneration pass runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionSelector {
    /// The version already a dependency of the working tree.
    Current,
    /// The tool shipped alongside this binary.
    Bundled,
    /// No pinning; the executable is resolved from `PATH`.
    None,
    /// An exact published version fetched on demand.
    Explicit(String),
}

impl VersionSelector {
    /// `true` for explicit versions before the legacy major-version boundary.
    pub fn is_legacy(&self) -> bool {
        match self {
            VersionSelector::Explicit(v) => is_legacy_version(v),
            _ => false,
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Current => write!(f, "current"),
            VersionSelector::Bundled => write!(f, "bundled"),
            VersionSelector::None => write!(f, "none"),
            VersionSelector::Explicit(v) => v.fmt(f),
        }
    }
}

impl FromStr for VersionSelector {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "bundled" => Ok(Self::Bundled),
            "none" => Ok(Self::None),
            _ => {
                let bare = strip_range_prefix(trimmed);
                semver::Version::parse(bare)
                    .map(|_| Self::Explicit(bare.to_owned()))
                    .map_err(|_| StoreError::InvalidVersion(s.to_owned()))
            }
        }
    }
}

impl TryFrom<String> for VersionSelector {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VersionSelector> for String {
    fn from(v: VersionSelector) -> Self {
        v.to_string()
    }
}

/// Strip npm range decorations (`^`, `~`, `=`, `v`) from a version string.
pub fn strip_range_prefix(version: &str) -> &str {
    version.trim_start_matches(['^', '~', '=', 'v', ' '])
}

/// A version string with a `.` whose major component predates the legacy boundary.
pub fn is_legacy_version(version: &str) -> bool {
    if !version.contains('.') {
        return false;
    }
    strip_range_prefix(version)
        .split('.')
        .next()
        .and_then(|major| major.parse::<u64>().ok())
        .is_some_and(|major| major < LEGACY_MAJOR_BOUNDARY)
}

// ---------------------------------------------------------------------------
// Blueprints
// ---------------------------------------------------------------------------

/// A plugin layered onto the base generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    /// Added for the target pass only; absent from the source application.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub new: bool,
}

impl Blueprint {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            target_version: None,
            new: false,
        }
    }

    /// npm package spec, `name@version` or bare `name` when unversioned.
    pub fn package_spec(&self, version: Option<&str>) -> String {
        match version {
            Some(v) => format!("{}@{}", self.name, v),
            None => self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// The persisted migration state, keyed exactly as on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_cli: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cli: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_version: Option<VersionSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<VersionSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_cli_options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cli_options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_application_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_application_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_application_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprints: Option<Vec<Blueprint>>,
}

impl MigrationConfig {
    /// Fill every key that is absent in `self` from `defaults`.
    ///
    /// Returns `true` when at least one key was filled.
    pub fn merge_defaults(&mut self, defaults: MigrationConfig) -> bool {
        fn fill<T>(slot: &mut Option<T>, default: Option<T>) -> bool {
            if slot.is_none() && default.is_some() {
                *slot = default;
                return true;
            }
            false
        }

        let mut changed = false;
        changed |= fill(&mut self.source_cli, defaults.source_cli);
        changed |= fill(&mut self.target_cli, defaults.target_cli);
        changed |= fill(&mut self.source_version, defaults.source_version);
        changed |= fill(&mut self.target_version, defaults.target_version);
        changed |= fill(&mut self.source_cli_options, defaults.source_cli_options);
        changed |= fill(&mut self.target_cli_options, defaults.target_cli_options);
        changed |= fill(
            &mut self.actual_application_branch,
            defaults.actual_application_branch,
        );
        changed |= fill(
            &mut self.source_application_branch,
            defaults.source_application_branch,
        );
        changed |= fill(
            &mut self.target_application_branch,
            defaults.target_application_branch,
        );
        changed |= fill(&mut self.blueprints, defaults.blueprints);
        changed
    }

    /// Overwrite every key that is present in `overrides`.
    pub fn apply_overrides(&mut self, overrides: MigrationConfig) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.source_cli, overrides.source_cli);
        set(&mut self.target_cli, overrides.target_cli);
        set(&mut self.source_version, overrides.source_version);
        set(&mut self.target_version, overrides.target_version);
        set(&mut self.source_cli_options, overrides.source_cli_options);
        set(&mut self.target_cli_options, overrides.target_cli_options);
        set(
            &mut self.actual_application_branch,
            overrides.actual_application_branch,
        );
        set(
            &mut self.source_application_branch,
            overrides.source_application_branch,
        );
        set(
            &mut self.target_application_branch,
            overrides.target_application_branch,
        );
        set(&mut self.blueprints, overrides.blueprints);
    }

    /// Produce the fully populated view, failing on absent keys or colliding branches.
    pub fn resolve(&self) -> Result<ResolvedConfig, StoreError> {
        let branches = BranchSet {
            actual: required(&self.actual_application_branch, "actualApplicationBranch")?,
            source: required(&self.source_application_branch, "sourceApplicationBranch")?,
            target: required(&self.target_application_branch, "targetApplicationBranch")?,
        };
        branches.validate()?;

        Ok(ResolvedConfig {
            source_cli: required(&self.source_cli, "sourceCli")?,
            target_cli: required(&self.target_cli, "targetCli")?,
            source_version: required(&self.source_version, "sourceVersion")?,
            target_version: required(&self.target_version, "targetVersion")?,
            source_cli_options: split_options(self.source_cli_options.as_deref()),
            target_cli_options: split_options(self.target_cli_options.as_deref()),
            branches,
            blueprints: self.blueprints.clone().unwrap_or_default(),
        })
    }
}

fn required<T: Clone>(slot: &Option<T>, key: &'static str) -> Result<T, StoreError> {
    slot.clone().ok_or(StoreError::MissingKey(key))
}

/// Split an opaque option string on whitespace; absent or blank yields nothing.
pub fn split_options(options: Option<&str>) -> Vec<String> {
    options
        .map(|o| o.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Resolved view
// ---------------------------------------------------------------------------

/// The three branch names a migration works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSet {
    /// User-owned branch checked out when the migration started.
    pub actual: String,
    /// Orphan scratch branch holding the regenerated "before" tree.
    pub source: String,
    /// Scratch branch holding the regenerated "after" tree.
    pub target: String,
}

impl BranchSet {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.actual == self.source || self.actual == self.target || self.source == self.target
        {
            return Err(StoreError::BranchCollision {
                actual: self.actual.clone(),
                source_branch: self.source.clone(),
                target: self.target.clone(),
            });
        }
        Ok(())
    }

    pub fn scratch(&self) -> [&str; 2] {
        [self.source.as_str(), self.target.as_str()]
    }
}

/// Every config key populated, options already split into argv form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub source_cli: String,
    pub target_cli: String,
    pub source_version: VersionSelector,
    pub target_version: VersionSelector,
    pub source_cli_options: Vec<String>,
    pub target_cli_options: Vec<String>,
    pub branches: BranchSet,
    pub blueprints: Vec<Blueprint>,
}

impl ResolvedConfig {
    /// Blueprints regenerated into the source application, at their recorded version.
    pub fn source_blueprints(&self) -> Vec<Blueprint> {
        self.blueprints
            .iter()
            .filter(|bp| !bp.new)
            .map(|bp| Blueprint::new(bp.name.clone(), bp.version.clone()))
            .collect()
    }

    /// Every blueprint at its target version, falling back to the recorded one.
    pub fn target_blueprints(&self) -> Vec<Blueprint> {
        self.blueprints
            .iter()
            .map(|bp| Blueprint {
                name: bp.name.clone(),
                version: bp.target_version.clone().or_else(|| bp.version.clone()),
                target_version: None,
                new: bp.new,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> MigrationConfig {
        MigrationConfig {
            source_cli: Some("jhipster".into()),
            target_cli: Some("jhipster".into()),
            source_version: Some(VersionSelector::Current),
            target_version: Some(VersionSelector::Bundled),
            source_cli_options: None,
            target_cli_options: Some("--skip-client  --foo".into()),
            actual_application_branch: Some("main".into()),
            source_application_branch: Some("jhipster_migrate_source".into()),
            target_application_branch: Some("jhipster_migrate_target".into()),
            blueprints: None,
        }
    }

    #[test]
    fn selector_parses_symbolic_values() {
        assert_eq!("current".parse::<VersionSelector>().unwrap(), VersionSelector::Current);
        assert_eq!("Bundled".parse::<VersionSelector>().unwrap(), VersionSelector::Bundled);
        assert_eq!("none".parse::<VersionSelector>().unwrap(), VersionSelector::None);
    }

    #[test]
    fn selector_strips_range_prefix() {
        assert_eq!(
            "^7.9.3".parse::<VersionSelector>().unwrap(),
            VersionSelector::Explicit("7.9.3".into())
        );
    }

    #[test]
    fn selector_rejects_garbage() {
        let err = "latest-ish".parse::<VersionSelector>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidVersion(_)));
    }

    #[test]
    fn legacy_boundary() {
        assert!(is_legacy_version("7.9.3"));
        assert!(is_legacy_version("^6.10.5"));
        assert!(!is_legacy_version("8.0.0"));
        assert!(!is_legacy_version("current"));
        assert!(!VersionSelector::Bundled.is_legacy());
    }

    #[test]
    fn selector_serializes_as_plain_string() {
        let json = serde_json::to_string(&VersionSelector::Explicit("8.1.0".into())).unwrap();
        assert_eq!(json, "\"8.1.0\"");
        let back: VersionSelector = serde_json::from_str("\"bundled\"").unwrap();
        assert_eq!(back, VersionSelector::Bundled);
    }

    #[test]
    fn merge_defaults_only_fills_absent_keys() {
        let mut cfg = MigrationConfig {
            source_cli: Some("custom".into()),
            ..Default::default()
        };
        let changed = cfg.merge_defaults(MigrationConfig {
            source_cli: Some("jhipster".into()),
            target_cli: Some("jhipster".into()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(cfg.source_cli.as_deref(), Some("custom"));
        assert_eq!(cfg.target_cli.as_deref(), Some("jhipster"));
        assert!(!cfg.merge_defaults(MigrationConfig {
            target_cli: Some("other".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn resolve_splits_options() {
        let resolved = populated().resolve().unwrap();
        assert!(resolved.source_cli_options.is_empty());
        assert_eq!(resolved.target_cli_options, vec!["--skip-client", "--foo"]);
    }

    #[test]
    fn resolve_rejects_colliding_branches() {
        let mut cfg = populated();
        cfg.actual_application_branch = Some("jhipster_migrate_target".into());
        assert!(matches!(
            cfg.resolve().unwrap_err(),
            StoreError::BranchCollision { .. }
        ));
    }

    #[test]
    fn resolve_reports_missing_key() {
        let mut cfg = populated();
        cfg.target_cli = None;
        assert!(matches!(cfg.resolve().unwrap_err(), StoreError::MissingKey("targetCli")));
    }

    #[test]
    fn new_blueprints_skip_source_pass() {
        let mut cfg = populated();
        cfg.blueprints = Some(vec![
            Blueprint {
                name: "generator-jhipster-kotlin".into(),
                version: Some("1.0.0".into()),
                target_version: Some("2.0.0".into()),
                new: false,
            },
            Blueprint {
                name: "generator-jhipster-vuejs".into(),
                version: None,
                target_version: Some("3.0.0".into()),
                new: true,
            },
        ]);
        let resolved = cfg.resolve().unwrap();
        let source = resolved.source_blueprints();
        assert_eq!(source.len(), 1);
        assert_eq!(source[0].version.as_deref(), Some("1.0.0"));

        let target = resolved.target_blueprints();
        assert_eq!(target.len(), 2);
        assert_eq!(target[0].version.as_deref(), Some("2.0.0"));
        assert_eq!(target[1].package_spec(target[1].version.as_deref()), "generator-jhipster-vuejs@3.0.0");
    }
}
