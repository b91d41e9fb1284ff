use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::{debug, info};

use crate::model::ProbeResult;
use crate::services::backends::installer::resolve_compiler_path;
use crate::services::probe::{Probe, ProbeError};
use crate::services::toolchain::ToolchainContext;
use crate::workspace::WorkspaceContext;

/// Probe that writes the snippet to the work dir and runs the compiler on it.
///
/// Arguments are the caller's `extra_args` followed by the configured flags,
/// with `{source}`, `{out}` and `{cache}` substituted.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    pub program: PathBuf,
    pub flags: Vec<String>,
    pub source_path: PathBuf,
    pub artifact_path: PathBuf,
    pub cache_dir: PathBuf,
    pub prelude: Option<String>,
    pub env: BTreeMap<String, String>,
}

impl CommandProbe {
    pub fn from_context(ws: &WorkspaceContext) -> Self {
        Self {
            program: resolve_compiler_path(&ws.config),
            flags: ws.config.compiler.flags.clone(),
            source_path: ws.layout.source_path(&ws.config),
            artifact_path: ws.layout.artifact_path(&ws.config),
            cache_dir: ws.layout.cache_dir.clone(),
            prelude: ws.config.compiler.prelude.clone(),
            env: ws.config.compiler.env.clone(),
        }
    }

    /// Full argument list for one probe.
    pub fn command_args(&self, extra_args: &[String]) -> Vec<String> {
        extra_args
            .iter()
            .cloned()
            .chain(self.flags.iter().map(|flag| self.substitute(flag)))
            .collect()
    }

    fn substitute(&self, flag: &str) -> String {
        flag.replace("{source}", &self.source_path.display().to_string())
            .replace("{out}", &self.artifact_path.display().to_string())
            .replace("{cache}", &self.cache_dir.display().to_string())
    }

    fn materialize(&self, snippet: &str) -> Result<(), ProbeError> {
        if let Some(parent) = self.source_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ProbeError::Prepare { path: parent.to_path_buf(), source })?;
        }
        let mut body = String::new();
        if let Some(prelude) = &self.prelude {
            body.push_str(prelude);
            if !prelude.ends_with('\n') {
                body.push('\n');
            }
        }
        body.push_str(snippet);
        fs::write(&self.source_path, body).map_err(|source| ProbeError::WriteSnippet {
            path: self.source_path.clone(),
            source,
        })?;

        // A stale artifact from the previous toolchain would be reported as this build's.
        match fs::remove_file(&self.artifact_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ProbeError::Prepare { path: self.artifact_path.clone(), source }),
        }
    }
}

impl Probe for CommandProbe {
    fn run(
        &self,
        ctx: &ToolchainContext<'_>,
        snippet: &str,
        extra_args: &[String],
    ) -> Result<ProbeResult, ProbeError> {
        self.materialize(snippet)?;
        let args = self.command_args(extra_args);
        debug!(active = ?ctx.active(), program = %self.program.display(), ?args, "probing");

        let started = Instant::now();
        let (success, output) =
            match Command::new(&self.program).args(&args).envs(&self.env).output() {
                Ok(out) => {
                    let mut text = String::from_utf8_lossy(&out.stdout).to_string();
                    text.push_str(&String::from_utf8_lossy(&out.stderr));
                    (out.status.success(), text.trim().to_string())
                }
                Err(e) => (false, format!("failed to spawn {}: {e}", self.program.display())),
            };
        let duration_ms = started.elapsed().as_millis() as u64;

        let (artifact_size_bytes, artifact) = artifact_info(&self.artifact_path);
        info!(success, duration_ms, artifact_size_bytes, "probe finished");
        Ok(ProbeResult { success, output, duration_ms, artifact_size_bytes, artifact })
    }
}

fn artifact_info(path: &Path) -> (u64, Option<PathBuf>) {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => (meta.len(), Some(path.to_path_buf())),
        _ => (0, None),
    }
}
