//! Commit search inside a regression window.
//!
//! The window is newest-first: failing revisions come before passing ones.
//!
//! Precondition: the window is *monotonic*, i.e. it holds at most one
//! fail -> pass transition in scan order. The halving phase relies on it and
//! is not validated; a non-monotonic window can make halving keep the wrong
//! half. Reported revisions may be off by one when the true boundary sits on
//! a halving pivot.
//!
//! Revisions that cannot be activated are excluded: an untestable pivot is
//! removed and halving continues on the remaining window.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{BisectionOutcome, RevisionId, RevisionWindow, Target};
use crate::services::history::{HistoryError, RevisionHistory};
use crate::services::probe::{Probe, ProbeError};
use crate::services::toolchain::{SelectOutcome, ToolchainContext};

pub const DEFAULT_LINEAR_THRESHOLD: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Halving,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Untestable,
}

/// One probe made during the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStep {
    pub revision: RevisionId,
    pub phase: SearchPhase,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub outcome: BisectionOutcome,
    pub steps: Vec<SearchStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BisectionSearch {
    /// Windows longer than this are halved before scanning.
    pub linear_threshold: usize,
}

impl Default for BisectionSearch {
    fn default() -> Self {
        Self { linear_threshold: DEFAULT_LINEAR_THRESHOLD }
    }
}

impl BisectionSearch {
    pub fn new(linear_threshold: usize) -> Self {
        Self { linear_threshold: linear_threshold.max(1) }
    }

    /// Narrow `window` to the breaking revision.
    pub fn search(
        &self,
        ctx: &mut ToolchainContext<'_>,
        probe: &dyn Probe,
        history: &mut dyn RevisionHistory,
        snippet: &str,
        extra_args: &[String],
        mut window: RevisionWindow,
    ) -> Result<SearchReport, SearchError> {
        let mut steps = Vec::new();

        while window.len() > self.linear_threshold {
            let mid = window.len().div_ceil(2);
            let pivot = match window.get(mid) {
                Some(rev) => rev.clone(),
                None => break,
            };
            let verdict = probe_revision(ctx, probe, snippet, extra_args, &pivot)?;
            steps.push(SearchStep { revision: pivot.clone(), phase: SearchPhase::Halving, verdict });
            match verdict {
                Verdict::Pass => window.keep_head(mid),
                Verdict::Fail => window.keep_tail(mid),
                Verdict::Untestable => {
                    // Dropping the pivot moves the next midpoint to a neighbour.
                    window.remove(mid);
                    warn!(
                        revision = %pivot,
                        remaining = window.len(),
                        "halving pivot untestable, dropped from the window"
                    );
                }
            }
            debug!(pivot = %pivot, ?verdict, remaining = window.len(), "halved window");
        }

        let mut last_failed: Option<RevisionId> = None;
        let mut breaking: Option<RevisionId> = None;
        for revision in window.iter() {
            let verdict = probe_revision(ctx, probe, snippet, extra_args, revision)?;
            steps.push(SearchStep {
                revision: revision.clone(),
                phase: SearchPhase::Linear,
                verdict,
            });
            match verdict {
                Verdict::Fail => last_failed = Some(revision.clone()),
                Verdict::Untestable => {}
                Verdict::Pass => {
                    // The boundary lies between the last failure and this pass.
                    breaking = Some(last_failed.take().unwrap_or_else(|| revision.clone()));
                    break;
                }
            }
        }

        let Some(revision) = breaking else {
            warn!(candidates = window.len(), "no revision in the window passed");
            return Ok(SearchReport {
                outcome: BisectionOutcome::NotFound { candidates: window },
                steps,
            });
        };

        let metadata = history.metadata(&revision)?;
        info!(revision = %revision, author = %metadata.author, "breaking revision found");
        Ok(SearchReport {
            outcome: BisectionOutcome::Found { revision, metadata, candidates: window },
            steps,
        })
    }
}

fn probe_revision(
    ctx: &mut ToolchainContext<'_>,
    probe: &dyn Probe,
    snippet: &str,
    extra_args: &[String],
    revision: &RevisionId,
) -> Result<Verdict, ProbeError> {
    match ctx.select(&Target::Revision(revision.clone())) {
        SelectOutcome::Active { .. } => {
            let result = probe.run(ctx, snippet, extra_args)?;
            Ok(if result.success { Verdict::Pass } else { Verdict::Fail })
        }
        SelectOutcome::Unavailable { .. } => Ok(Verdict::Untestable),
    }
}
