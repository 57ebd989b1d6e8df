//! Blueprint name normalisation and `name[@version]` list parsing.

use crate::types::Blueprint;

const BLUEPRINT_PREFIX: &str = "generator-jhipster-";

/// Prepend `generator-jhipster-` to a blueprint name when needed.
///
/// Scoped names (`@scope/name`) get the prefix on the unscoped part.
pub fn normalize_blueprint_name(blueprint: &str) -> String {
    if let Some(scoped) = blueprint.strip_prefix('@') {
        return match scoped.split_once('/') {
            Some((scope, name)) if !name.starts_with(BLUEPRINT_PREFIX) => {
                format!("@{scope}/{BLUEPRINT_PREFIX}{name}")
            }
            _ => blueprint.to_owned(),
        };
    }
    if blueprint.is_empty() || blueprint.starts_with("generator-jhipster") {
        return blueprint.to_owned();
    }
    format!("{BLUEPRINT_PREFIX}{blueprint}")
}

/// Parse `name[@version]` into a normalised [`Blueprint`].
///
/// A leading `@` is a scope marker, never a version separator.
pub fn parse_blueprint_info(blueprint: &str) -> Blueprint {
    let blueprint = blueprint.trim();
    match blueprint.rfind('@') {
        Some(idx) if idx > 0 => Blueprint::new(
            normalize_blueprint_name(&blueprint[..idx]),
            Some(blueprint[idx + 1..].to_owned()).filter(|v| !v.is_empty()),
        ),
        _ => Blueprint::new(normalize_blueprint_name(blueprint), None),
    }
}

/// Split a comma-separated blueprint list, skipping empty entries.
pub fn parse_blueprints(list: &str) -> Vec<Blueprint> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_blueprint_info)
        .collect()
}

/// Fold requested target versions into the recorded blueprint list.
///
/// A requested name already recorded gets its `target_version` set; an
/// unknown one is appended as a `new` blueprint.
pub fn merge_target_blueprints(recorded: &mut Vec<Blueprint>, requested: Vec<Blueprint>) {
    for wanted in requested {
        match recorded.iter_mut().find(|bp| bp.name == wanted.name) {
            Some(existing) => existing.target_version = wanted.version,
            None => recorded.push(Blueprint {
                name: wanted.name,
                version: None,
                target_version: wanted.version,
                new: true,
            }),
        }
    }
}
