use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::model::{RevisionId, RevisionMetadata, ToolchainId};
use crate::services::history::{resolve_moving, HistoryError, RevisionHistory};
use crate::services::toolchain::ToolchainContext;
use crate::workspace::WorkspaceContext;

/// History backed by a single git checkout of the toolchain's sources.
#[derive(Debug, Clone)]
pub struct GitHistory {
    pub repo: PathBuf,
    pub url: String,
    pub branch: String,
    /// Frozen release tag -> revision table.
    pub releases: BTreeMap<String, RevisionId>,
}

impl GitHistory {
    pub fn new(repo: impl AsRef<Path>, releases: BTreeMap<String, RevisionId>) -> Self {
        Self {
            repo: repo.as_ref().to_path_buf(),
            url: String::new(),
            branch: "devel".to_string(),
            releases,
        }
    }

    pub fn from_context(ws: &WorkspaceContext) -> Self {
        let releases = ws
            .config
            .release_revisions
            .iter()
            .map(|(tag, rev)| (tag.trim().to_lowercase(), RevisionId::new(rev)))
            .collect();
        Self {
            repo: ws.layout.repository_path(&ws.config),
            url: ws.config.repository.url.clone(),
            branch: ws.config.repository.branch.clone(),
            releases,
        }
    }

    /// Clone the repository if the checkout does not exist yet. Every git-backed
    /// operation calls this first, so a fresh workspace clones on first use.
    pub fn ensure_checkout(&self) -> Result<(), HistoryError> {
        if self.repo.exists() {
            return Ok(());
        }
        info!(url = %self.url, path = %self.repo.display(), "cloning toolchain history");
        let repo = self.repo.display().to_string();
        run_git(None, &["clone", &self.url, &repo])?;
        self.git(&["-c", "advice.detachedHead=false", "checkout", &self.branch])?;
        Ok(())
    }

    fn git(&self, args: &[&str]) -> Result<String, HistoryError> {
        run_git(Some(&self.repo), args)
    }

    /// Tags missing from the frozen table are looked up as `v<tag>` without moving the checkout.
    fn tag_revision(&self, tag: &str) -> Option<RevisionId> {
        if let Err(e) = self.ensure_checkout() {
            debug!(tag, error = %e, "no checkout for release tag lookup");
            return None;
        }
        let spec = format!("v{tag}^{{commit}}");
        match self.git(&["rev-parse", "--short", &spec]) {
            Ok(out) => Some(RevisionId::new(out)).filter(|rev| !rev.is_empty()),
            Err(e) => {
                debug!(tag, error = %e, "release tag lookup failed");
                None
            }
        }
    }
}

impl RevisionHistory for GitHistory {
    fn resolve(&mut self, ctx: &mut ToolchainContext<'_>, id: &ToolchainId) -> Option<RevisionId> {
        let resolved = match id {
            ToolchainId::Release(tag) => {
                self.releases.get(tag).cloned().or_else(|| self.tag_revision(tag))
            }
            ToolchainId::Moving(_) => resolve_moving(ctx, id),
        };
        debug!(identifier = %id, revision = ?resolved, "resolved identifier");
        resolved
    }

    fn between(&self, old: &RevisionId, new: &RevisionId) -> Result<Vec<RevisionId>, HistoryError> {
        self.ensure_checkout()?;
        let range = format!("{old}..{new}");
        let out = self.git(&["log", "--pretty=format:%h", &range])?;
        Ok(out.lines().map(RevisionId::new).filter(|rev| !rev.is_empty()).collect())
    }

    fn metadata(&mut self, revision: &RevisionId) -> Result<RevisionMetadata, HistoryError> {
        self.ensure_checkout()?;
        self.git(&["-c", "advice.detachedHead=false", "checkout", "--quiet", revision.as_str()])
            .map_err(|e| match e {
                HistoryError::Git { .. } => HistoryError::UnknownRevision(revision.clone()),
                other => other,
            })?;
        let author = self.git(&["log", "-1", "--pretty=format:%an"])?;
        let message = self.git(&["log", "-1", "--pretty=format:%B"])?;
        let timestamp = self.git(&["log", "-1", "--pretty=format:%aI"])?;
        let files = self.git(&["diff-tree", "--root", "--no-commit-id", "--name-only", "-r", "HEAD"])?;

        Ok(RevisionMetadata {
            revision: revision.clone(),
            author: author.trim().to_string(),
            message: message.trim().to_string(),
            timestamp: timestamp.trim().to_string(),
            files: files.lines().map(str::trim).filter(|f| !f.is_empty()).map(String::from).collect(),
        })
    }
}

fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<String, HistoryError> {
    let mut cmd = Command::new("git");
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd.args(args).output()?;
    if !output.status.success() {
        return Err(HistoryError::Git {
            command: args.join(" "),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
