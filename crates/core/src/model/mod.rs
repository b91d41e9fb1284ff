//! Core data model for toolchain identifiers, revisions, and probe results.
//!
//! Everything here is created and consumed within a single bisect run; nothing
//! is persisted between runs.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A name referring either to a fixed release or to a moving target.
///
/// No ordering is defined: the version matrix is probed in the order the
/// caller supplies, never in release chronology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ToolchainId {
    /// Symbolic name whose revision changes over time (e.g. `devel`, `stable`).
    Moving(String),
    /// Immutable release tag (e.g. `2.0.0`).
    Release(String),
}

impl ToolchainId {
    /// Classify a raw identifier using the configured list of moving names.
    ///
    /// Matching is case-insensitive; the stored name is trimmed and lowercased.
    pub fn classify(raw: &str, moving: &[String]) -> Self {
        let name = raw.trim().to_lowercase();
        if moving.iter().any(|m| m.trim().eq_ignore_ascii_case(&name)) {
            ToolchainId::Moving(name)
        } else {
            ToolchainId::Release(name)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolchainId::Moving(name) | ToolchainId::Release(name) => name,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, ToolchainId::Moving(_))
    }
}

impl fmt::Display for ToolchainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle (short hash) into the continuous commit history.
///
/// Intentionally not `Ord`: relative position is only known to a
/// [`RevisionHistory`](crate::services::history::RevisionHistory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Normalize a raw hash: strips quotes, a leading `#`, surrounding
    /// whitespace, and lowercases.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let cleaned = raw.as_ref().trim().trim_matches(|c| c == '\'' || c == '"');
        let cleaned = cleaned.trim_start_matches('#').trim();
        Self(cleaned.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the toolchain switcher activates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Toolchain(ToolchainId),
    Revision(RevisionId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Toolchain(id) => write!(f, "{id}"),
            Target::Revision(rev) => write!(f, "#{rev}"),
        }
    }
}

/// Author, message, date, and changed files for one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMetadata {
    pub revision: RevisionId,
    pub author: String,
    pub message: String,
    /// Author date, RFC 3339.
    pub timestamp: String,
    pub files: Vec<String>,
}

/// Outcome of one compile-and-run attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
    pub output: String,
    pub duration_ms: u64,
    pub artifact_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

/// Ordered, newest-first span of revisions between a working and a failing boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionWindow(Vec<RevisionId>);

impl RevisionWindow {
    pub fn new(revisions: Vec<RevisionId>) -> Self {
        Self(revisions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RevisionId> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RevisionId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[RevisionId] {
        &self.0
    }

    /// Keep `[0, end)`. Never grows the window.
    pub fn keep_head(&mut self, end: usize) {
        self.0.truncate(end);
    }

    /// Keep `[start, len)`. Never grows the window.
    pub fn keep_tail(&mut self, start: usize) {
        let start = start.min(self.0.len());
        self.0.drain(..start);
    }

    /// Remove the revision at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<RevisionId> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }
}

impl FromIterator<RevisionId> for RevisionWindow {
    fn from_iter<I: IntoIterator<Item = RevisionId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of narrowing a regression window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BisectionOutcome {
    /// The breaking revision, with the scanned window it was found in.
    Found { revision: RevisionId, metadata: RevisionMetadata, candidates: RevisionWindow },
    /// No revision in the scanned window passed.
    NotFound { candidates: RevisionWindow },
}

impl BisectionOutcome {
    pub fn breaking_revision(&self) -> Option<&RevisionId> {
        match self {
            BisectionOutcome::Found { revision, .. } => Some(revision),
            BisectionOutcome::NotFound { .. } => None,
        }
    }

    pub fn candidates(&self) -> &RevisionWindow {
        match self {
            BisectionOutcome::Found { candidates, .. }
            | BisectionOutcome::NotFound { candidates } => candidates,
        }
    }
}
