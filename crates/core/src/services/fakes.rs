//! In-memory fakes for the collaborator traits (testing only).
//!
//! Provides `ScriptedInstaller`, `ScriptedProbe` and `MemoryHistory`, which
//! satisfy the trait contracts without any toolchain, compiler or git.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::model::{ProbeResult, RevisionId, RevisionMetadata, Target, ToolchainId};
use crate::services::history::{resolve_moving, HistoryError, RevisionHistory};
use crate::services::probe::{Probe, ProbeError};
use crate::services::toolchain::{
    RetryingSwitcher, SelectError, ToolchainContext, ToolchainInstaller,
};

// ---------------------------------------------------------------------------
// ScriptedInstaller
// ---------------------------------------------------------------------------

/// Installer whose failures are scripted per target (keyed by `Target`'s display form).
#[derive(Debug, Default)]
pub struct ScriptedInstaller {
    /// Targets that never install.
    unavailable: HashSet<String>,
    /// Targets that fail this many times before installing.
    flaky: Mutex<HashMap<String, u32>>,
    /// Revision each moving identifier reports once active.
    reports: HashMap<String, RevisionId>,
    attempts: Mutex<Vec<String>>,
    active: Mutex<Option<String>>,
}

impl ScriptedInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable(mut self, target: impl Into<String>) -> Self {
        self.unavailable.insert(target.into());
        self
    }

    pub fn flaky(self, target: impl Into<String>, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(target.into(), failures);
        self
    }

    pub fn reports(mut self, identifier: impl Into<String>, revision: &str) -> Self {
        self.reports.insert(identifier.into(), RevisionId::new(revision));
        self
    }

    /// Every install attempt in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, target: &str) -> usize {
        self.attempts.lock().unwrap().iter().filter(|t| t.as_str() == target).count()
    }

    /// Wrap in the retrying switcher used in production.
    pub fn into_switcher(self) -> RetryingSwitcher<Self> {
        RetryingSwitcher::new(self)
    }
}

impl ToolchainInstaller for ScriptedInstaller {
    fn install(&self, target: &Target) -> Result<String, SelectError> {
        let key = target.to_string();
        self.attempts.lock().unwrap().push(key.clone());
        if self.unavailable.contains(&key) {
            *self.active.lock().unwrap() = None;
            return Err(SelectError::Failed { status: "exit 1".into(), output: "unavailable".into() });
        }
        let mut flaky = self.flaky.lock().unwrap();
        if let Some(left) = flaky.get_mut(&key) {
            if *left > 0 {
                *left -= 1;
                return Err(SelectError::Failed { status: "exit 1".into(), output: "flaky".into() });
            }
        }
        *self.active.lock().unwrap() = Some(key.clone());
        Ok(format!("installed {key}"))
    }

    fn reported_revision(&self) -> Option<RevisionId> {
        let active = self.active.lock().unwrap().clone()?;
        self.reports.get(&active).cloned()
    }
}

// ---------------------------------------------------------------------------
// ScriptedProbe
// ---------------------------------------------------------------------------

/// Probe whose verdict depends on which target the context has active.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    verdicts: HashMap<String, bool>,
    default_pass: bool,
    runs: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(mut self, target: impl Into<String>) -> Self {
        self.verdicts.insert(target.into(), true);
        self
    }

    pub fn fail(mut self, target: impl Into<String>) -> Self {
        self.verdicts.insert(target.into(), false);
        self
    }

    /// Verdict for targets with no script entry.
    pub fn default_pass(mut self, pass: bool) -> Self {
        self.default_pass = pass;
        self
    }

    /// Active targets the probe ran under, in order.
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

impl Probe for ScriptedProbe {
    fn run(
        &self,
        ctx: &ToolchainContext<'_>,
        snippet: &str,
        extra_args: &[String],
    ) -> Result<ProbeResult, ProbeError> {
        let key = ctx.active().map(|t| t.to_string()).unwrap_or_default();
        self.runs.lock().unwrap().push(key.clone());
        let success = self.verdicts.get(&key).copied().unwrap_or(self.default_pass);
        Ok(ProbeResult {
            success,
            output: format!("{key}: {} {}", extra_args.join(" "), snippet.len()),
            duration_ms: 1,
            artifact_size_bytes: if success { 1024 } else { 0 },
            artifact: None,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryHistory
// ---------------------------------------------------------------------------

/// Linear in-memory history, stored newest first.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    revisions: Vec<RevisionId>,
    releases: BTreeMap<String, RevisionId>,
    checked_out: Option<RevisionId>,
    metadata_calls: usize,
}

impl MemoryHistory {
    /// `revisions` must be newest first.
    pub fn new<S: AsRef<str>>(revisions: &[S]) -> Self {
        Self { revisions: revisions.iter().map(RevisionId::new).collect(), ..Self::default() }
    }

    pub fn release(mut self, tag: impl Into<String>, revision: &str) -> Self {
        self.releases.insert(tag.into(), RevisionId::new(revision));
        self
    }

    pub fn checked_out(&self) -> Option<&RevisionId> {
        self.checked_out.as_ref()
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls
    }

    fn position(&self, rev: &RevisionId) -> Result<usize, HistoryError> {
        self.revisions
            .iter()
            .position(|r| r == rev)
            .ok_or_else(|| HistoryError::UnknownRevision(rev.clone()))
    }
}

impl RevisionHistory for MemoryHistory {
    fn resolve(&mut self, ctx: &mut ToolchainContext<'_>, id: &ToolchainId) -> Option<RevisionId> {
        match id {
            ToolchainId::Release(tag) => self.releases.get(tag).cloned(),
            ToolchainId::Moving(_) => resolve_moving(ctx, id),
        }
    }

    fn between(&self, old: &RevisionId, new: &RevisionId) -> Result<Vec<RevisionId>, HistoryError> {
        let old_pos = self.position(old)?;
        let new_pos = self.position(new)?;
        if new_pos >= old_pos {
            return Ok(Vec::new());
        }
        Ok(self.revisions[new_pos..old_pos].to_vec())
    }

    fn metadata(&mut self, revision: &RevisionId) -> Result<RevisionMetadata, HistoryError> {
        self.position(revision)?;
        self.metadata_calls += 1;
        self.checked_out = Some(revision.clone());
        Ok(RevisionMetadata {
            revision: revision.clone(),
            author: "fake author".into(),
            message: format!("commit {revision}"),
            timestamp: "2024-01-01T00:00:00+00:00".into(),
            files: vec![format!("src/{revision}.nim")],
        })
    }
}
