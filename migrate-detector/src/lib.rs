//! Project detection for `migrate-detector`.
//!
//! `detect_project(path)` inspects the generator config file (`.yo-rc.json`)
//! and the dependency manifest (`package.json`) at a working-tree root and
//! returns what the migration needs to know about the host application:
//! its name, the generator version it records, the generator version pinned
//! as a dev dependency, and the blueprints it was generated with.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use migrate_core::{
    paths::{package_json_path, project_config_path, GENERATOR_PACKAGE},
    Blueprint,
};

const VERSION_KEY: &str = "jhipsterVersion";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What the working tree says about the generated application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedProject {
    /// `baseName` from the generator config.
    pub base_name: String,
    /// Generator version recorded in the generator config, if any.
    pub recorded_version: Option<String>,
    /// `devDependencies["generator-jhipster"]` from `package.json`, if any.
    pub dependency_pin: Option<String>,
    /// Blueprints recorded in the generator config.
    pub blueprints: Vec<Blueprint>,
}

impl DetectedProject {
    /// Version the source application was generated with: the dependency
    /// pin when present, otherwise the recorded version.
    pub fn current_source_version(&self) -> Option<&str> {
        self.dependency_pin
            .as_deref()
            .or(self.recorded_version.as_deref())
    }
}

/// Errors from project detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error(
        "could not find a valid project configuration, check that '{path}' exists and contains a 'generator-jhipster' key"
    )]
    MissingProjectConfig { path: PathBuf },

    #[error("'{path}' does not contain a JHipster project (no baseName)")]
    NotAProject { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect the generated application rooted at `root`.
///
/// Fails when the generator config is missing, lacks the generator key, or
/// has no `baseName`. A missing `package.json` is not an error.
pub fn detect_project(root: &Path) -> Result<DetectedProject, DetectError> {
    let config_path = project_config_path(root);
    let Some(config) = read_json(&config_path)? else {
        return Err(DetectError::MissingProjectConfig { path: config_path });
    };
    let Some(generator) = config.get(GENERATOR_PACKAGE).and_then(Value::as_object) else {
        return Err(DetectError::MissingProjectConfig { path: config_path });
    };

    let base_name = generator
        .get("baseName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DetectError::NotAProject {
            path: config_path.clone(),
        })?
        .to_string();

    let recorded_version = generator
        .get(VERSION_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);

    let blueprints = generator
        .get("blueprints")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(blueprint_from_value).collect())
        .unwrap_or_default();

    Ok(DetectedProject {
        base_name,
        recorded_version,
        dependency_pin: dependency_pin(root)?,
        blueprints,
    })
}

/// `devDependencies["generator-jhipster"]` from `package.json`.
pub fn dependency_pin(root: &Path) -> Result<Option<String>, DetectError> {
    let Some(manifest) = read_json(&package_json_path(root))? else {
        return Ok(None);
    };
    Ok(manifest
        .get("devDependencies")
        .and_then(|deps| deps.get(GENERATOR_PACKAGE))
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Remove the recorded generator version from the generator config so the
/// next regeneration writes its own. Returns `true` when a key was removed.
pub fn strip_tool_version(root: &Path) -> Result<bool, DetectError> {
    let path = project_config_path(root);
    let Some(mut config) = read_json(&path)? else {
        return Err(DetectError::MissingProjectConfig { path });
    };
    let removed = config
        .get_mut(GENERATOR_PACKAGE)
        .and_then(Value::as_object_mut)
        .and_then(|generator| generator.remove(VERSION_KEY))
        .is_some();
    if removed {
        let mut contents = serde_json::to_string_pretty(&config).map_err(|e| {
            DetectError::ParseError {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        contents.push('\n');
        fs::write(&path, contents)?;
    }
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_json(path: &Path) -> Result<Option<Value>, DetectError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| DetectError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn blueprint_from_value(value: &Value) -> Option<Blueprint> {
    let name = value.get("name").and_then(Value::as_str)?;
    let version = value
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Blueprint::new(name, version))
}
