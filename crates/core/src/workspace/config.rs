use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current config format version. This is about the file format, not a toolchain version.
pub const CONFIG_VERSION: &str = "0.1.0";

/// Serializable configuration describing a bisect workspace.
///
/// This lives at `bisect.yaml` in the workspace root. Every section has
/// defaults so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BisectConfig {
    #[serde(default = "default_config_version")]
    pub config_version: String,
    /// Identifiers probed by the version matrix, in probe order.
    #[serde(default = "default_versions")]
    pub versions: Vec<String>,
    /// Identifiers that are moving targets and must be resolved by activating them.
    #[serde(default = "default_moving")]
    pub moving: Vec<String>,
    /// Frozen release tag -> revision table. Historical tags never move.
    #[serde(default = "default_release_revisions")]
    pub release_revisions: BTreeMap<String, String>,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub installer: InstallerConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for BisectConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            versions: default_versions(),
            moving: default_moving(),
            release_revisions: default_release_revisions(),
            repository: RepositoryConfig::default(),
            installer: InstallerConfig::default(),
            compiler: CompilerConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Where the toolchain's source history lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Clone URL used when `path` does not exist yet.
    pub url: String,
    /// Checkout path, relative to the workspace root unless absolute.
    pub path: String,
    /// Branch checked out right after cloning.
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: "https://github.com/nim-lang/Nim.git".to_string(),
            path: ".bisect/Nim".to_string(),
            branch: default_branch(),
        }
    }
}

/// Installer invoked to activate a toolchain identifier or revision.
///
/// The target is appended as the final argument; revisions are passed as `#<hash>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("CHOOSENIM_NO_ANALYTICS".to_string(), "1".to_string());
        Self {
            program: "choosenim".to_string(),
            args: vec![
                "--noColor".to_string(),
                "--skipClean".to_string(),
                "--yes".to_string(),
                "update".to_string(),
            ],
            env,
        }
    }
}

/// Compiler invocation used by probes and for reading back the active revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub program: String,
    /// Arguments that print version info including the build's revision.
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,
    /// Line prefix (case-insensitive) that carries the revision in version output.
    #[serde(default = "default_revision_prefix")]
    pub revision_prefix: String,
    /// Flags appended after the caller's arguments. `{source}`, `{out}` and
    /// `{cache}` are substituted.
    #[serde(default = "default_flags")]
    pub flags: Vec<String>,
    /// File name of the materialized snippet inside the work dir.
    #[serde(default = "default_source_file")]
    pub source_file: String,
    /// File name of the produced artifact inside the work dir.
    #[serde(default = "default_artifact_file")]
    pub artifact_file: String,
    /// Text prepended to every snippet before compiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prelude: Option<String>,
    /// Extra environment for compile+run.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "nim".to_string(),
            version_args: default_version_args(),
            revision_prefix: default_revision_prefix(),
            flags: default_flags(),
            source_file: default_source_file(),
            artifact_file: default_artifact_file(),
            prelude: None,
            env: BTreeMap::new(),
        }
    }
}

/// Tuning for the commit search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Windows larger than this are halved before the linear scan.
    #[serde(default = "default_linear_threshold")]
    pub linear_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { linear_threshold: default_linear_threshold() }
    }
}

fn default_config_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_versions() -> Vec<String> {
    ["devel", "stable", "2.0.0", "1.6.0", "1.4.0", "1.2.0", "1.0.0", "0.20.2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_moving() -> Vec<String> {
    vec!["devel".to_string(), "stable".to_string()]
}

fn default_release_revisions() -> BTreeMap<String, String> {
    [
        ("2.0.0", "a488067"),
        ("1.6.0", "727c637"),
        ("1.4.0", "018ae96"),
        ("1.2.0", "7e83adf"),
        ("1.0.0", "f7a8fc4"),
        ("0.20.2", "88a0edb"),
    ]
    .iter()
    .map(|(tag, rev)| (tag.to_string(), rev.to_string()))
    .collect()
}

fn default_branch() -> String {
    "devel".to_string()
}

fn default_version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

fn default_revision_prefix() -> String {
    "git hash:".to_string()
}

fn default_flags() -> Vec<String> {
    [
        "--forceBuild:on",
        "--colors:off",
        "--verbosity:0",
        "--hints:off",
        "--warnings:off",
        "--lineTrace:off",
        "--nimcache:{cache}",
        "--out:{out}",
        "{source}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_source_file() -> String {
    "temp.nim".to_string()
}

fn default_artifact_file() -> String {
    "temp".to_string()
}

fn default_linear_threshold() -> usize {
    10
}
