//! Shared fixtures: a throwaway git repository holding a generated
//! application, and a fake generator whose output depends on the version.

#![allow(dead_code)]

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use migrate_core::{MigrationConfig, VersionSelector};
use migrate_engine::{
    generator::{GenerateRequest, Generator, Pass},
    Collaborators, Git, LineEndingNormalizer, MigrateError, MigrateSettings, MigrationReport,
    NonInteractive, Normalizer, StaleBranchPolicy,
};
use tempfile::TempDir;

pub const SOURCE_VERSION: &str = "7.0.0";
pub const TARGET_VERSION: &str = "8.0.0";
pub const APP_FILE: &str = "src/main/App.java";
pub const KEYSTORE: &str = "src/main/resources/config/tls/keystore.p12";

static GIT_ENV: Once = Once::new();

/// Isolate git from the developer's global and system config.
pub fn isolate_git() {
    GIT_ENV.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        std::env::set_var("GIT_CONFIG_NOSYSTEM", "1");
        std::env::set_var("GIT_CONFIG_GLOBAL", "/dev/null");
        std::env::set_var("GIT_AUTHOR_NAME", "Migrate Test");
        std::env::set_var("GIT_AUTHOR_EMAIL", "migrate@example.com");
        std::env::set_var("GIT_COMMITTER_NAME", "Migrate Test");
        std::env::set_var("GIT_COMMITTER_EMAIL", "migrate@example.com");
    });
}

pub fn git(root: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .expect("run git command");
    assert!(
        output.status.success(),
        "git {:?} failed:\nstdout:{}\nstderr:{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn local_branches(root: &Path) -> Vec<String> {
    let mut branches: Vec<String> = git(root, &["branch", "--format=%(refname:short)"])
        .lines()
        .map(str::to_string)
        .collect();
    branches.sort();
    branches
}

// ---------------------------------------------------------------------------
// Fake generator
// ---------------------------------------------------------------------------

/// App source as generated by `version`, optionally with a customised field.
pub fn app_java(version: &str, custom: i32) -> String {
    format!(
        "class App {{\n    String version = \"{version}\";\n    // a\n    // b\n    // c\n    int custom = {custom};\n}}\n"
    )
}

pub fn yo_rc(version: &str) -> String {
    format!(
        "{{\n  \"generator-jhipster\": {{\n    \"baseName\": \"app\",\n    \"jhipsterVersion\": \"{version}\"\n  }}\n}}\n"
    )
}

/// Write the whole generated tree for `version` into `root`.
pub fn write_generated(root: &Path, version: &str) {
    fs::create_dir_all(root.join("src/main/resources/config/tls")).unwrap();
    fs::write(root.join(".yo-rc.json"), yo_rc(version)).unwrap();
    fs::write(root.join(".gitignore"), "node_modules/\n").unwrap();
    fs::write(root.join("README.md"), format!("# app\n\ngenerated by {version}\n")).unwrap();
    fs::write(root.join(APP_FILE), app_java(version, 0)).unwrap();
    fs::write(root.join(KEYSTORE), version.as_bytes()).unwrap();
}

/// Generator that writes [`write_generated`] output for explicit versions.
#[derive(Default)]
pub struct FakeGenerator {
    pub fail_on: Option<Pass>,
}

impl Generator for FakeGenerator {
    fn invoke(&self, root: &Path, request: &GenerateRequest) -> Result<(), MigrateError> {
        let version = request.version.to_string();
        if self.fail_on == Some(request.pass) {
            return Err(MigrateError::Generation {
                pass: request.pass.to_string(),
                version,
                command: format!("fake-{}", request.cli),
                status: Some(1),
            });
        }
        write_generated(root, &version);
        Ok(())
    }
}

/// Line-ending normalizer that fails on its `fail_at`-th call (1-based).
pub struct FailingNormalizer {
    pub fail_at: usize,
    calls: Cell<usize>,
}

impl FailingNormalizer {
    pub fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            calls: Cell::new(0),
        }
    }
}

impl Normalizer for FailingNormalizer {
    fn normalize(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>, MigrateError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_at {
            return Err(MigrateError::Io {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "formatter crashed"),
            });
        }
        LineEndingNormalizer.normalize(root, files)
    }
}

// ---------------------------------------------------------------------------
// Repository fixture
// ---------------------------------------------------------------------------

/// A committed application generated with [`SOURCE_VERSION`] plus one
/// user-owned file.
pub fn project_repo() -> (TempDir, PathBuf) {
    isolate_git();
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    git(&root, &["init", "--quiet"]);
    write_generated(&root, SOURCE_VERSION);
    fs::remove_file(root.join(KEYSTORE)).unwrap();
    fs::write(root.join("src/main/Custom.java"), "class Custom {}\n").unwrap();
    git(&root, &["add", "."]);
    git(&root, &["commit", "--quiet", "-m", "initial"]);
    (dir, root)
}

pub fn settings() -> MigrateSettings {
    MigrateSettings {
        commit_delay: Duration::ZERO,
        install_command: None,
        overrides: MigrationConfig {
            source_version: Some(VersionSelector::Explicit(SOURCE_VERSION.into())),
            target_version: Some(VersionSelector::Explicit(TARGET_VERSION.into())),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn run_with(
    root: &Path,
    settings: MigrateSettings,
    generator: &FakeGenerator,
) -> Result<MigrationReport, MigrateError> {
    run_with_normalizer(root, settings, generator, &LineEndingNormalizer)
}

pub fn run_with_normalizer(
    root: &Path,
    settings: MigrateSettings,
    generator: &FakeGenerator,
    normalizer: &dyn Normalizer,
) -> Result<MigrationReport, MigrateError> {
    let vcs = Git::new(root);
    let tools = Collaborators {
        vcs: &vcs,
        generator,
        normalizer,
        prompter: &NonInteractive,
    };
    migrate_engine::pipeline::run(root, settings, tools)
}

/// Subjects reachable from `rev`, oldest first, following first parents.
pub fn first_parent_subjects(root: &Path, rev: &str) -> Vec<String> {
    git(root, &["log", "--first-parent", "--reverse", "--format=%s", rev])
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn run(root: &Path) -> Result<MigrationReport, MigrateError> {
    run_with(root, settings(), &FakeGenerator::default())
}

pub fn with_policy(policy: StaleBranchPolicy) -> MigrateSettings {
    MigrateSettings {
        stale_branches: policy,
        ..settings()
    }
}
