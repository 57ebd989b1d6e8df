//! Optional global git configuration offered in verbose runs: three-way
//! conflict markers and a `package.json` merge driver.

use std::io::Write;
use std::path::{Path, PathBuf};

use migrate_core::paths::PACKAGE_JSON;

use crate::error::{io_err, MigrateError};
use crate::prompt::Prompter;
use crate::vcs::Vcs;

pub const CONFLICT_STYLE_KEY: &str = "merge.conflictstyle";
pub const DIFF3: &str = "diff3";

pub const PACKAGE_JSON_DRIVER: &str = "git-merge-packagejson";
pub const PACKAGE_JSON_DRIVER_REF: &str = "package-json";

/// Global keys the `package.json` merge driver needs, in the order they are set.
pub fn package_json_driver_config(home: &Path) -> Vec<(String, String)> {
    vec![
        (
            "core.attributesfile".to_string(),
            home.join(".gitattributes").to_string_lossy().into_owned(),
        ),
        (
            format!("merge.{PACKAGE_JSON_DRIVER_REF}.driver"),
            format!("npx --yes {PACKAGE_JSON_DRIVER} %A %O %B"),
        ),
        (
            format!("merge.{PACKAGE_JSON_DRIVER_REF}.name"),
            "custom merge driver for package.json files".to_string(),
        ),
    ]
}

/// Offer to set `merge.conflictstyle = diff3` globally. Returns `true` when set.
pub fn setup_three_way_diff(vcs: &dyn Vcs, prompter: &dyn Prompter) -> Result<bool, MigrateError> {
    if vcs.get_config(CONFLICT_STYLE_KEY)?.as_deref() == Some(DIFF3) {
        tracing::info!("three way merge already set up");
        return Ok(false);
    }

    tracing::info!(
        "three way merge is recommended; accepting adds `{CONFLICT_STYLE_KEY} = {DIFF3}` to your global git configuration"
    );
    if !prompter.confirm("Do you want to setup three way merge?", false)? {
        tracing::info!("three way merge ignored");
        return Ok(false);
    }

    vcs.add_config(CONFLICT_STYLE_KEY, DIFF3, true)?;
    tracing::info!("three way merge set up; to undo run: git config --global --unset {CONFLICT_STYLE_KEY}");
    Ok(true)
}

/// Offer to install the `package.json` merge driver globally.
///
/// Only keys that are not already configured are written. Returns the
/// cleanup instructions for whatever was changed.
pub fn setup_package_json_driver(
    vcs: &dyn Vcs,
    prompter: &dyn Prompter,
    home: &Path,
) -> Result<Vec<String>, MigrateError> {
    let driver_key = format!("merge.{PACKAGE_JSON_DRIVER_REF}.driver");
    if vcs.get_config(&driver_key)?.is_some() && merge_attribute(vcs)?.ends_with(PACKAGE_JSON_DRIVER_REF) {
        tracing::info!("{PACKAGE_JSON_DRIVER} already set up");
        return Ok(Vec::new());
    }

    let config = package_json_driver_config(home);
    tracing::info!(
        "{PACKAGE_JSON_DRIVER} is recommended to merge {PACKAGE_JSON}; accepting adds {} to your global git configuration",
        config
            .iter()
            .map(|(k, v)| format!("`{k} = {v}`"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let question = format!("Do you want to setup {PACKAGE_JSON_DRIVER}?");
    if !prompter.confirm(&question, false)? {
        tracing::info!("{PACKAGE_JSON_DRIVER} ignored");
        return Ok(Vec::new());
    }

    let mut cleanup = Vec::new();
    for (key, value) in &config {
        if vcs.get_config(key)?.is_none() {
            vcs.add_config(key, value, true)?;
            cleanup.push(format!("git config --global --unset {key}"));
        }
    }

    if merge_attribute(vcs)?.contains("unspecified") {
        match vcs.get_config("core.attributesfile")? {
            Some(file) => {
                let file = PathBuf::from(file);
                let line = format!("{PACKAGE_JSON} merge={PACKAGE_JSON_DRIVER_REF}");
                append_line(&file, &line)?;
                cleanup.push(format!("remove '{line}' from {}", file.display()));
            }
            None => tracing::warn!("core.attributesfile is not set; skipping attribute registration"),
        }
    }

    tracing::info!("{PACKAGE_JSON_DRIVER} set up; to undo: {}", cleanup.join("; "));
    Ok(cleanup)
}

fn merge_attribute(vcs: &dyn Vcs) -> Result<String, MigrateError> {
    Ok(vcs.raw(&["check-attr", "merge", PACKAGE_JSON])?.trim().to_string())
}

fn append_line(path: &Path, line: &str) -> Result<(), MigrateError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    writeln!(file, "{line}").map_err(|e| io_err(path, e))
}
