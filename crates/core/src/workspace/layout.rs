use std::path::{Path, PathBuf};

use crate::workspace::BisectConfig;

/// Logical layout of a bisect workspace on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    /// Root directory of the workspace.
    pub root: PathBuf,
    /// Path to the workspace config file (YAML).
    pub config_path: PathBuf,
    /// Scratch directory for snippets and build artifacts (.bisect).
    pub work_dir: PathBuf,
    /// Compiler cache / intermediate output directory.
    pub cache_dir: PathBuf,
    /// Directory for JSON bisect reports.
    pub reports_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Compute the default layout for a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let config_path = root.join("bisect.yaml");
        let work_dir = root.join(".bisect");
        let cache_dir = work_dir.join("cache");
        let reports_dir = work_dir.join("reports");

        Self { root, config_path, work_dir, cache_dir, reports_dir }
    }

    /// Resolve a config path that may be relative to the workspace root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Path the snippet is materialized to before every probe.
    pub fn source_path(&self, config: &BisectConfig) -> PathBuf {
        self.work_dir.join(&config.compiler.source_file)
    }

    /// Path of the artifact the compiler is told to produce.
    pub fn artifact_path(&self, config: &BisectConfig) -> PathBuf {
        self.work_dir.join(&config.compiler.artifact_file)
    }

    /// History checkout directory.
    pub fn repository_path(&self, config: &BisectConfig) -> PathBuf {
        self.resolve(&config.repository.path)
    }
}
