use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use predicates::str::contains;

const YO_RC: &str = r#"{
  "generator-jhipster": {
    "baseName": "app",
    "jhipsterVersion": "7.9.3"
  }
}
"#;

fn migrate_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jhipster-migrate"));
    cmd.arg("migrate")
        .arg("--cwd")
        .arg(root)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_AUTHOR_NAME", "Migrate Test")
        .env("GIT_AUTHOR_EMAIL", "migrate@example.com")
        .env("GIT_COMMITTER_NAME", "Migrate Test")
        .env("GIT_COMMITTER_EMAIL", "migrate@example.com")
        .env("JHIPSTER_MIGRATE_BUNDLED_CLI", "/nonexistent/cli.cjs")
        .env_remove("RUST_LOG");
    cmd
}

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(root)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_AUTHOR_NAME", "Migrate Test")
        .env("GIT_AUTHOR_EMAIL", "migrate@example.com")
        .env("GIT_COMMITTER_NAME", "Migrate Test")
        .env("GIT_COMMITTER_EMAIL", "migrate@example.com")
        .status()
        .expect("run git");
    assert!(status.success(), "git {args:?} failed");
}

#[test]
fn help_lists_migration_flags() {
    Command::new(assert_cmd::cargo::cargo_bin!("jhipster-migrate"))
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(
            contains("--source-version")
                .and(contains("--target-version"))
                .and(contains("--target-blueprints"))
                .and(contains("--change-config"))
                .and(contains("--stale-branches"))
                .and(contains("--formatter")),
        );
}

#[test]
fn missing_project_config_fails_without_touching_the_tree() {
    let dir = TempDir::new().unwrap();
    dir.child("README.md").write_str("# not generated\n").unwrap();

    migrate_cmd(dir.path())
        .assert()
        .failure()
        .stderr(contains("could not find a valid project configuration"));

    dir.child(".jhipster-migrate").assert(predicate::path::missing());
    dir.child(".git").assert(predicate::path::missing());
}

#[test]
fn dirty_tree_is_refused() {
    let dir = TempDir::new().unwrap();
    dir.child(".yo-rc.json").write_str(YO_RC).unwrap();
    git(dir.path(), &["init", "--quiet"]);
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "--quiet", "-m", "initial"]);
    dir.child("notes.txt").write_str("work in progress\n").unwrap();

    migrate_cmd(dir.path())
        .args(["--source-version", "7.9.3", "--target-version", "8.1.0"])
        .assert()
        .failure()
        .stderr(contains("local changes found").and(contains("notes.txt")));

    dir.child("notes.txt").assert("work in progress\n");
}

#[test]
fn invalid_version_selector_is_a_usage_error() {
    let dir = TempDir::new().unwrap();

    migrate_cmd(dir.path())
        .args(["--target-version", "latest"])
        .assert()
        .code(2)
        .stderr(contains("invalid version selector 'latest'"));
}

#[test]
fn unknown_stale_branch_policy_is_rejected() {
    let dir = TempDir::new().unwrap();

    migrate_cmd(dir.path())
        .args(["--stale-branches", "later"])
        .assert()
        .code(2)
        .stderr(contains("unknown stale branch policy"));
}

#[test]
fn missing_working_directory_is_reported() {
    let dir = TempDir::new().unwrap();

    migrate_cmd(&dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(contains("cannot access"));
}
