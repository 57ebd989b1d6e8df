//! Project detection tests for `migrate-detector`.
//!
//! Each case gets an isolated `TempDir`: no shared state.

use migrate_detector::{dependency_pin, detect_project, strip_tool_version, DetectError};
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn make_dir() -> TempDir {
    TempDir::new().expect("tempdir")
}

fn write(dir: &TempDir, filename: &str, content: &str) {
    fs::write(dir.path().join(filename), content).expect("write fixture");
}

// ---------------------------------------------------------------------------
// Project config validation
// ---------------------------------------------------------------------------

#[test]
fn missing_project_config_is_rejected() {
    let dir = make_dir();
    let err = detect_project(dir.path()).unwrap_err();
    assert!(matches!(err, DetectError::MissingProjectConfig { .. }));
    assert!(err.to_string().contains(".yo-rc.json"));
}

#[rstest]
#[case(r#"{}"#)]
#[case(r#"{"generator-other": {"baseName": "x"}}"#)]
#[case(r#"{"generator-jhipster": "not an object"}"#)]
fn config_without_generator_key_is_rejected(#[case] content: &str) {
    let dir = make_dir();
    write(&dir, ".yo-rc.json", content);
    let err = detect_project(dir.path()).unwrap_err();
    assert!(matches!(err, DetectError::MissingProjectConfig { .. }));
}

#[test]
fn config_without_base_name_is_not_a_project() {
    let dir = make_dir();
    write(&dir, ".yo-rc.json", r#"{"generator-jhipster": {"jhipsterVersion": "8.0.0"}}"#);
    let err = detect_project(dir.path()).unwrap_err();
    assert!(matches!(err, DetectError::NotAProject { .. }));
}

#[test]
fn malformed_config_reports_parse_error() {
    let dir = make_dir();
    write(&dir, ".yo-rc.json", "{ nope");
    let err = detect_project(dir.path()).unwrap_err();
    assert!(matches!(err, DetectError::ParseError { .. }));
}

// ---------------------------------------------------------------------------
// Versions and blueprints
// ---------------------------------------------------------------------------

#[test]
fn detects_recorded_version_and_blueprints() {
    let dir = make_dir();
    write(
        &dir,
        ".yo-rc.json",
        r#"{"generator-jhipster": {
            "baseName": "upgradeTest",
            "jhipsterVersion": "7.9.3",
            "blueprints": [
                {"name": "generator-jhipster-kotlin", "version": "1.15.0"},
                {"version": "no-name-is-skipped"}
            ]
        }}"#,
    );
    let project = detect_project(dir.path()).expect("detect");
    assert_eq!(project.base_name, "upgradeTest");
    assert_eq!(project.recorded_version.as_deref(), Some("7.9.3"));
    assert!(project.dependency_pin.is_none());
    assert_eq!(project.blueprints.len(), 1);
    assert_eq!(project.blueprints[0].version.as_deref(), Some("1.15.0"));
    assert_eq!(project.current_source_version(), Some("7.9.3"));
}

#[rstest]
#[case(r#"{"devDependencies": {"generator-jhipster": "8.1.0"}}"#, Some("8.1.0"))]
#[case(r#"{"dependencies": {"generator-jhipster": "8.1.0"}}"#, None)]
#[case(r#"{"devDependencies": {}}"#, None)]
fn dependency_pin_reads_dev_dependencies(#[case] manifest: &str, #[case] expected: Option<&str>) {
    let dir = make_dir();
    write(&dir, "package.json", manifest);
    assert_eq!(dependency_pin(dir.path()).expect("pin").as_deref(), expected);
}

#[test]
fn dependency_pin_missing_manifest_is_none() {
    let dir = make_dir();
    assert!(dependency_pin(dir.path()).expect("pin").is_none());
}

// ---------------------------------------------------------------------------
// Version stripping
// ---------------------------------------------------------------------------

#[test]
fn strip_removes_only_the_version_key() {
    let dir = make_dir();
    write(
        &dir,
        ".yo-rc.json",
        r#"{"generator-jhipster": {"baseName": "app", "jhipsterVersion": "7.9.3", "skipClient": true}}"#,
    );
    assert!(strip_tool_version(dir.path()).expect("strip"));

    let content = fs::read_to_string(dir.path().join(".yo-rc.json")).unwrap();
    assert!(!content.contains("jhipsterVersion"));
    assert!(content.contains("\"baseName\": \"app\""));
    assert!(content.contains("skipClient"));

    assert!(!strip_tool_version(dir.path()).expect("second strip is a no-op"));
}
