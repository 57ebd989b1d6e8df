use std::path::{Path, PathBuf};

pub const BASE_APPLICATION: &str = "source";
pub const ACTUAL_APPLICATION: &str = "actual";
pub const TARGET_APPLICATION: &str = "target";

pub const MIGRATE_SOURCE_BRANCH: &str = "jhipster_migrate_source";
pub const MIGRATE_TARGET_BRANCH: &str = "jhipster_migrate_target";

pub const MIGRATE_TMP_FOLDER: &str = ".jhipster-migrate";
pub const MIGRATE_CONFIG_FILE: &str = "config.json";

pub const PROJECT_CONFIG_FILE: &str = ".yo-rc.json";
pub const PROJECT_CACHE_DIR: &str = ".jhipster";
pub const PACKAGE_JSON: &str = "package.json";
pub const PACKAGE_LOCK: &str = "package-lock.json";
pub const NODE_MODULES: &str = "node_modules";
pub const GIT_DIR: &str = ".git";
pub const GITIGNORE: &str = ".gitignore";

pub const GENERATOR_PACKAGE: &str = "generator-jhipster";
pub const DEFAULT_CLI: &str = "jhipster";

pub const DEFAULT_CLI_OPTIONS: &str =
    "--force --skip-install --skip-git --ignore-errors --no-insight --skip-checks";
pub const LEGACY_CLI_OPTIONS: &str = "--with-entities --prefer-global";
/// First generator major version that no longer needs the legacy option set.
pub const LEGACY_MAJOR_BOUNDARY: u64 = 8;
pub const LEGACY_NODE_VERSION: &str = "16.20.2";

pub const GIT_VERSION_ALLOW_UNRELATED_HISTORIES: &str = "2.9.0";

pub const KEYSTORE_ARTIFACT: &str = "src/main/resources/config/tls/keystore.p12";

/// Top-level entries the cleanup pass never deletes. `.gitignore` stays so a
/// second pass sees the same patterns as the first.
pub const CLEANUP_ALLOW_LIST: &[&str] = &[
    PROJECT_CONFIG_FILE,
    GITIGNORE,
    PROJECT_CACHE_DIR,
    PACKAGE_JSON,
    PACKAGE_LOCK,
    NODE_MODULES,
    GIT_DIR,
    MIGRATE_TMP_FOLDER,
];

pub fn tmp_dir(root: &Path) -> PathBuf {
    root.join(MIGRATE_TMP_FOLDER)
}

pub fn config_path(root: &Path) -> PathBuf {
    tmp_dir(root).join(MIGRATE_CONFIG_FILE)
}

pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(PROJECT_CONFIG_FILE)
}

pub fn package_json_path(root: &Path) -> PathBuf {
    root.join(PACKAGE_JSON)
}

/// Per-pass npm cache, e.g. `.jhipster-migrate/npx-exec/target`.
pub fn npm_cache_dir(root: &Path, pass: &str) -> PathBuf {
    tmp_dir(root).join("npx-exec").join(pass)
}

/// Pathspec excluding the scratch directory from `git add`.
pub fn exclude_tmp_pathspec() -> String {
    format!(":!{MIGRATE_TMP_FOLDER}")
}
