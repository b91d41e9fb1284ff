use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;
use tracing::debug;

use crate::model::{RevisionId, Target};
use crate::services::toolchain::{parse_reported_revision, SelectError, ToolchainInstaller};
use crate::workspace::BisectConfig;

/// Installer that shells out to a toolchain manager (choosenim by default),
/// passing the target as the final argument.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub compiler: PathBuf,
    pub version_args: Vec<String>,
    pub revision_prefix: String,
    /// Fixed for the whole run so every build sees the same epoch.
    pub source_date_epoch: String,
}

impl CommandInstaller {
    pub fn from_config(config: &BisectConfig) -> Self {
        Self {
            program: resolve_installer_path(config),
            args: config.installer.args.clone(),
            env: config.installer.env.clone(),
            compiler: resolve_compiler_path(config),
            version_args: config.compiler.version_args.clone(),
            revision_prefix: config.compiler.revision_prefix.clone(),
            source_date_epoch: current_epoch(),
        }
    }
}

impl ToolchainInstaller for CommandInstaller {
    fn install(&self, target: &Target) -> Result<String, SelectError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(target.to_string())
            .envs(&self.env)
            .env("SOURCE_DATE_EPOCH", &self.source_date_epoch)
            .output()
            .map_err(|e| SelectError::Spawn(format!("{}: {e}", self.program.display())))?;
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            return Err(SelectError::Failed {
                status: output.status.to_string(),
                output: text.trim().to_string(),
            });
        }
        Ok(text)
    }

    fn reported_revision(&self) -> Option<RevisionId> {
        let output = Command::new(&self.compiler).args(&self.version_args).output().ok()?;
        if !output.status.success() {
            debug!(status = %output.status, "compiler version command failed");
            return None;
        }
        parse_reported_revision(&String::from_utf8_lossy(&output.stdout), &self.revision_prefix)
    }
}

/// Installer executable: `BISECT_INSTALLER` overrides the configured program.
pub fn resolve_installer_path(config: &BisectConfig) -> PathBuf {
    std::env::var_os("BISECT_INSTALLER")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(&config.installer.program).to_path_buf())
}

/// Compiler executable: `BISECT_COMPILER` overrides the configured program.
pub fn resolve_compiler_path(config: &BisectConfig) -> PathBuf {
    std::env::var_os("BISECT_COMPILER")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(&config.compiler.program).to_path_buf())
}

fn current_epoch() -> String {
    Utc::now().timestamp().to_string()
}
