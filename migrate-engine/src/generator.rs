//! Regeneration invoker.
//!
//! [`Generator`] is the seam the orchestrator calls once per pass;
//! [`ProcessGenerator`] resolves a [`VersionSelector`] to concrete commands
//! and runs them as blocking subprocesses.
//!
//! Resolution policy:
//!
//! | selector | command |
//! |---|---|
//! | `none` | `<cli> <args>` from `PATH` |
//! | `current`, pinned in `package.json` | `npm install`, then `npx <cli> <args>` |
//! | `bundled` | `<bundled tool> app <args>` |
//! | explicit, or `current` without a pin | `npx --yes --package generator-jhipster@<v> … -- <cli> <args>` |

use std::fmt;
use std::path::{Path, PathBuf};

use migrate_core::{
    paths::{
        npm_cache_dir, BASE_APPLICATION, GENERATOR_PACKAGE, LEGACY_CLI_OPTIONS,
        LEGACY_NODE_VERSION, TARGET_APPLICATION,
    },
    types::is_legacy_version,
    Blueprint, VersionSelector,
};
use migrate_detector::{dependency_pin, detect_project};

use crate::error::MigrateError;
use crate::process::{CommandSpec, IoMode};

/// Which regeneration pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Source,
    Target,
}

impl Pass {
    pub fn label(self) -> &'static str {
        match self {
            Pass::Source => BASE_APPLICATION,
            Pass::Target => TARGET_APPLICATION,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One regeneration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub pass: Pass,
    /// Executable name, e.g. `jhipster`.
    pub cli: String,
    pub version: VersionSelector,
    pub blueprints: Vec<Blueprint>,
    /// Full argv after the executable (user options plus defaults).
    pub args: Vec<String>,
    pub io: IoMode,
}

/// Runs the external generation tool against a working tree.
pub trait Generator {
    /// Run to completion. A non-zero exit is [`MigrateError::Generation`].
    fn invoke(&self, root: &Path, request: &GenerateRequest) -> Result<(), MigrateError>;
}

// ---------------------------------------------------------------------------
// Process-backed implementation
// ---------------------------------------------------------------------------

/// Concrete commands for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Commands run before the generator, e.g. `npm install`.
    pub setup: Vec<CommandSpec>,
    pub command: CommandSpec,
    /// Version label recorded for diagnostics.
    pub version: String,
}

/// [`Generator`] that spawns `npm`/`npx`/the tool itself.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    bundled_cli: PathBuf,
}

impl ProcessGenerator {
    /// `bundled_cli` is the tool shipped alongside this binary.
    pub fn new(bundled_cli: impl Into<PathBuf>) -> Self {
        Self {
            bundled_cli: bundled_cli.into(),
        }
    }

    /// Turn a request into commands without running anything.
    pub fn resolve(&self, root: &Path, request: &GenerateRequest) -> Result<Invocation, MigrateError> {
        let mut args = request.args.clone();

        match &request.version {
            VersionSelector::None => Ok(Invocation {
                setup: Vec::new(),
                command: CommandSpec::new(&request.cli).args(args),
                version: "none".to_string(),
            }),
            VersionSelector::Bundled => {
                let command = CommandSpec::new(self.bundled_cli.to_string_lossy())
                    .arg("app")
                    .args(args);
                Ok(Invocation {
                    setup: Vec::new(),
                    command,
                    version: "bundled".to_string(),
                })
            }
            VersionSelector::Current => match dependency_pin(root)? {
                Some(pin) => {
                    if is_legacy_version(&pin) {
                        push_legacy_options(&mut args);
                    }
                    Ok(Invocation {
                        setup: vec![CommandSpec::new("npm").arg("install")],
                        command: CommandSpec::new("npx").arg(&request.cli).args(args),
                        version: pin,
                    })
                }
                None => {
                    let recorded = detect_project(root)?.recorded_version.ok_or_else(|| {
                        MigrateError::UnresolvedVersion {
                            pass: request.pass.to_string(),
                        }
                    })?;
                    Ok(self.npx_invocation(root, request, &recorded, args))
                }
            },
            VersionSelector::Explicit(version) => {
                Ok(self.npx_invocation(root, request, version, args))
            }
        }
    }

    fn npx_invocation(
        &self,
        root: &Path,
        request: &GenerateRequest,
        version: &str,
        mut args: Vec<String>,
    ) -> Invocation {
        let legacy = is_legacy_version(version);
        if legacy {
            push_legacy_options(&mut args);
        }

        let mut command = CommandSpec::new("npx").arg("--yes");
        if legacy {
            command = command
                .arg("--package")
                .arg(format!("node@{LEGACY_NODE_VERSION}"));
        }
        command = command
            .arg("--package")
            .arg(format!("{GENERATOR_PACKAGE}@{version}"));
        for blueprint in &request.blueprints {
            command = command
                .arg("--package")
                .arg(blueprint.package_spec(blueprint.version.as_deref()));
        }
        let cache = npm_cache_dir(root, request.pass.label());
        let command = command
            .arg("--")
            .arg(&request.cli)
            .args(args)
            .env("npm_config_cache", cache.to_string_lossy());

        Invocation {
            setup: Vec::new(),
            command,
            version: version.to_string(),
        }
    }
}

fn push_legacy_options(args: &mut Vec<String>) {
    for option in LEGACY_CLI_OPTIONS.split_whitespace() {
        if !args.iter().any(|a| a == option) {
            args.push(option.to_string());
        }
    }
}

impl Generator for ProcessGenerator {
    fn invoke(&self, root: &Path, request: &GenerateRequest) -> Result<(), MigrateError> {
        let invocation = self.resolve(root, request)?;
        for step in invocation.setup.iter().chain(Some(&invocation.command)) {
            tracing::info!("running {step}");
            let status = step.run(root, request.io)?;
            if !status.success() {
                return Err(MigrateError::Generation {
                    pass: request.pass.to_string(),
                    version: invocation.version.clone(),
                    command: step.to_string(),
                    status: status.code(),
                });
            }
        }
        Ok(())
    }
}
