//! Revision history: resolving identifiers, listing windows, reading metadata.

use thiserror::Error;

use crate::model::{RevisionId, RevisionMetadata, ToolchainId};
use crate::services::toolchain::ToolchainContext;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to spawn git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} exited with {status}: {stderr}")]
    Git { command: String, status: String, stderr: String },
    #[error("unknown revision {0}")]
    UnknownRevision(RevisionId),
}

/// Access to the toolchain's continuous history.
///
/// Implementations own a single checkout; `metadata` moves it, so it takes `&mut self`.
pub trait RevisionHistory {
    /// Map an identifier to a revision. Fixed releases must not touch the
    /// toolchain; moving identifiers are activated through `ctx` and read back.
    fn resolve(&mut self, ctx: &mut ToolchainContext<'_>, id: &ToolchainId) -> Option<RevisionId>;

    /// Revisions reachable from `new` but not from `old`, newest first.
    fn between(&self, old: &RevisionId, new: &RevisionId) -> Result<Vec<RevisionId>, HistoryError>;

    /// Check out `revision` and read its metadata. Leaves the checkout at `revision`.
    fn metadata(&mut self, revision: &RevisionId) -> Result<RevisionMetadata, HistoryError>;
}

/// Shared moving-identifier resolution: activate, then ask the toolchain what it is.
pub fn resolve_moving(ctx: &mut ToolchainContext<'_>, id: &ToolchainId) -> Option<RevisionId> {
    let target = crate::model::Target::Toolchain(id.clone());
    if !ctx.select(&target).is_active() {
        return None;
    }
    ctx.reported_revision()
}
