//! npm registry lookup for the newest published generator.

use std::time::Duration;

use anyhow::{Context, Result};
use migrate_core::paths::GENERATOR_PACKAGE;
use serde::Deserialize;

const REGISTRY_URL: &str = "https://registry.npmjs.org";

#[derive(Debug, Deserialize)]
struct DistTag {
    version: String,
}

/// Version behind the `latest` dist-tag of the generator package.
pub fn latest_generator_version() -> Result<String> {
    let url = format!("{REGISTRY_URL}/{GENERATOR_PACKAGE}/latest");
    let tag: DistTag = ureq::get(&url)
        .timeout(Duration::from_secs(10))
        .call()
        .with_context(|| format!("failed to query {url}"))?
        .into_json()
        .context("unexpected registry response")?;
    Ok(tag.version)
}
