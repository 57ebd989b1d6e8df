//! `jhipster-migrate migrate`: run the full regeneration and merge.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use migrate_core::{blueprint::parse_blueprints, MigrationConfig, VersionSelector};
use migrate_engine::{
    pipeline, Collaborators, CommandNormalizer, CommandSpec, Git, LineEndingNormalizer,
    MigrateSettings, MigrationReport, NonInteractive, Normalizer, ProcessGenerator, Prompter,
    StaleBranchPolicy,
};

use crate::interactive::TerminalPrompter;
use crate::registry::latest_generator_version;

/// Overrides the location of the generator shipped with this tool.
pub const BUNDLED_CLI_ENV: &str = "JHIPSTER_MIGRATE_BUNDLED_CLI";

/// Arguments for `jhipster-migrate migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Project root; defaults to the current directory.
    #[arg(long, default_value = ".")]
    pub cwd: PathBuf,

    /// Generator executable for the source pass.
    #[arg(long)]
    pub source_cli: Option<String>,

    /// Generator executable for the target pass.
    #[arg(long)]
    pub target_cli: Option<String>,

    /// Version the application was generated with: current, bundled, none or a semver.
    #[arg(long)]
    pub source_version: Option<VersionSelector>,

    /// Version to migrate to: current, bundled, none or a semver.
    #[arg(long)]
    pub target_version: Option<VersionSelector>,

    /// Extra options for the source pass.
    #[arg(long, allow_hyphen_values = true)]
    pub source_cli_options: Option<String>,

    /// Extra options for the target pass.
    #[arg(long, allow_hyphen_values = true)]
    pub target_cli_options: Option<String>,

    /// Comma-separated `name[@version]` blueprints for the target pass.
    #[arg(long)]
    pub target_blueprints: Option<String>,

    /// Ask questions, offer git setup and show generator output.
    #[arg(long)]
    pub verbose: bool,

    /// Pause before each regeneration so the config can be edited.
    #[arg(long)]
    pub change_config: bool,

    /// Keep the `.jhipster-migrate` directory after the run.
    #[arg(long)]
    pub keep_config: bool,

    /// Do not install dependencies after a clean merge.
    #[arg(long)]
    pub skip_install: bool,

    /// What to do with scratch branches left by an earlier run:
    /// prompt, abort, delete or resume.
    #[arg(long)]
    pub stale_branches: Option<StaleBranchPolicy>,

    /// Formatting command run over the generated files (default: CRLF to LF only).
    #[arg(long)]
    pub formatter: Option<String>,

    /// Emit the result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl MigrateArgs {
    pub fn run(self) -> Result<()> {
        let root = self
            .cwd
            .canonicalize()
            .with_context(|| format!("cannot access {}", self.cwd.display()))?;

        let normalizer: Box<dyn Normalizer> = match &self.formatter {
            Some(line) => Box::new(CommandNormalizer::new(
                CommandSpec::parse(line).context("--formatter must not be empty")?,
            )),
            None => Box::new(LineEndingNormalizer),
        };
        let prompter: Box<dyn Prompter> = if self.verbose || self.change_config {
            Box::new(TerminalPrompter::new())
        } else {
            Box::new(NonInteractive)
        };
        let generator = ProcessGenerator::new(bundled_cli_path()?);
        let vcs = Git::new(&root);
        let json = self.json;
        let settings = self.into_settings();

        let tools = Collaborators {
            vcs: &vcs,
            generator: &generator,
            normalizer: normalizer.as_ref(),
            prompter: prompter.as_ref(),
        };
        let report = pipeline::run(&root, settings, tools)
            .with_context(|| format!("migration failed in {}", root.display()))?;

        if json {
            print_json(&root, &report)?;
        } else {
            print_report(&report);
        }
        Ok(())
    }

    fn into_settings(self) -> MigrateSettings {
        let default_target_version = if self.verbose && self.target_version.is_none() {
            match latest_generator_version() {
                Ok(version) => Some(version),
                Err(err) => {
                    eprintln!("{} {err:#}", "could not look up the latest version:".yellow());
                    None
                }
            }
        } else {
            None
        };

        MigrateSettings {
            verbose: self.verbose,
            change_config: self.change_config,
            keep_config: self.keep_config,
            skip_install: self.skip_install,
            stale_branches: self
                .stale_branches
                .unwrap_or_else(|| StaleBranchPolicy::default_for(self.verbose)),
            overrides: MigrationConfig {
                source_cli: self.source_cli,
                target_cli: self.target_cli,
                source_version: self.source_version,
                target_version: self.target_version,
                source_cli_options: self.source_cli_options,
                target_cli_options: self.target_cli_options,
                ..Default::default()
            },
            target_blueprints: self
                .target_blueprints
                .as_deref()
                .map(parse_blueprints)
                .unwrap_or_default(),
            default_target_version,
            ..Default::default()
        }
    }
}

/// `$JHIPSTER_MIGRATE_BUNDLED_CLI`, else `cli/cli.cjs` next to this binary.
fn bundled_cli_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(BUNDLED_CLI_ENV) {
        return Ok(PathBuf::from(path));
    }
    let exe = std::env::current_exe().context("could not locate the running executable")?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(dir.join("cli").join("cli.cjs"))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct BranchRow {
    #[tabled(rename = "ROLE")]
    role: &'static str,
    #[tabled(rename = "BRANCH")]
    branch: String,
}

fn print_report(report: &MigrationReport) {
    let rows = vec![
        BranchRow {
            role: "application",
            branch: report.actual.clone(),
        },
        BranchRow {
            role: "source",
            branch: report.source.clone(),
        },
        BranchRow {
            role: "target",
            branch: report.target.clone(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if report.is_clean() {
        println!("{}", "✓ migration merged without conflicts".green().bold());
    } else {
        println!(
            "{}",
            format!(
                "⚠ merge left {} file(s) with conflicts; resolve them and commit:",
                report.conflicts.len()
            )
            .yellow()
            .bold()
        );
        for path in &report.conflicts {
            println!("  {}  {path}", "✗".red());
        }
    }

    if report.installed {
        println!("  {} dependencies installed", "·".dimmed());
    }
    if !report.config_removed {
        println!("  {} migration config kept in .jhipster-migrate/", "·".dimmed());
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    root: &'a Path,
    clean: bool,
    #[serde(flatten)]
    report: &'a MigrationReport,
}

fn print_json(root: &Path, report: &MigrationReport) -> Result<()> {
    let payload = JsonReport {
        root,
        clean: report.is_clean(),
        report,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
