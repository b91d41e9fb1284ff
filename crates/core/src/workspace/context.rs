use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::workspace::{load_config, BisectConfig, WorkspaceLayout};

/// Convenience wrapper bundling layout, config, and the config path it came from.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub layout: WorkspaceLayout,
    pub config: BisectConfig,
    pub config_path: PathBuf,
}

impl WorkspaceContext {
    /// Load the workspace config for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = WorkspaceLayout::new(root);
        let config = load_config(&layout)?;
        let config_path = layout.config_path.clone();
        Ok(Self { layout, config, config_path })
    }

    /// Create the scratch directories probes and reports write into.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.layout.work_dir, &self.layout.cache_dir, &self.layout.reports_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
