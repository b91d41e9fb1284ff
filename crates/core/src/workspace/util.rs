use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::workspace::{BisectConfig, WorkspaceLayout};

/// Parse a config body, choosing JSON or YAML by the path's extension.
pub fn parse_config(path: &Path, body: &str) -> Result<BisectConfig> {
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(body).context("Failed to parse bisect config JSON")
    } else {
        serde_yaml::from_str(body).context("Failed to parse bisect config YAML")
    }
}

/// Load the workspace config from disk for a given layout.
pub fn load_config(layout: &WorkspaceLayout) -> Result<BisectConfig> {
    load_config_from(&layout.config_path)
}

/// Load a config file from an explicit path.
pub fn load_config_from(path: &Path) -> Result<BisectConfig> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bisect config at {}", path.display()))?;
    parse_config(path, &body)
}

/// Serialize and write a config file as YAML.
pub fn write_config(path: &Path, config: &BisectConfig) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize bisect config")?;
    fs::write(path, yaml)
        .with_context(|| format!("Failed to write bisect config at {}", path.display()))?;
    Ok(())
}
