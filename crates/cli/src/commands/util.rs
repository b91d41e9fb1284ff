use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bisect_core::model::ToolchainId;
use bisect_core::services::backends::CommandInstaller;
use bisect_core::services::RetryingSwitcher;
use bisect_core::workspace::{BisectConfig, WorkspaceContext};

use crate::{canonicalize_or_current, sha256_bytes};

/// Load the workspace rooted at `root`.
pub fn load_workspace(root: &str) -> Result<WorkspaceContext> {
    let root_path = canonicalize_or_current(root)?;
    WorkspaceContext::from_root(&root_path)
}

/// A snippet read from disk, with the hash recorded in reports.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub text: String,
    pub sha256: String,
}

pub fn read_snippet(path: &str) -> Result<Snippet> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read snippet at {}", path))?;
    let sha256 = sha256_bytes(&bytes);
    let text = String::from_utf8(bytes)
        .with_context(|| format!("Snippet at {} is not valid UTF-8", path))?;
    Ok(Snippet { text, sha256 })
}

/// Identifiers to probe: `--versions` when given, otherwise the configured list.
pub fn identifiers(config: &BisectConfig, versions: &[String]) -> Result<Vec<ToolchainId>> {
    let raw = if versions.is_empty() { &config.versions } else { versions };
    let ids: Vec<ToolchainId> = raw
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| ToolchainId::classify(v, &config.moving))
        .collect();
    if ids.is_empty() {
        return Err(anyhow!("No toolchain identifiers to probe (set `versions` or pass --versions)"));
    }
    Ok(ids)
}

pub fn switcher_for(config: &BisectConfig) -> RetryingSwitcher<CommandInstaller> {
    RetryingSwitcher::new(CommandInstaller::from_config(config))
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
