//! End-to-end pipeline: version matrix, boundary resolution, commit search.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{RevisionId, RevisionWindow, ToolchainId};
use crate::services::history::{HistoryError, RevisionHistory};
use crate::services::matrix::{MatrixReport, VersionMatrixRunner};
use crate::services::probe::{Probe, ProbeError};
use crate::services::search::{BisectionSearch, SearchError, SearchReport};
use crate::services::toolchain::ToolchainContext;

/// Infrastructure faults that abort a run. Everything else is folded into the report.
#[derive(Debug, Error)]
pub enum BisectError {
    #[error("probe infrastructure failure: {0}")]
    Probe(#[from] ProbeError),
    #[error("history failure: {0}")]
    History(#[from] HistoryError),
}

impl From<SearchError> for BisectError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Probe(e) => BisectError::Probe(e),
            SearchError::History(e) => BisectError::History(e),
        }
    }
}

/// Why the commit search did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The matrix found no pass/fail pair.
    NoRegressionWindow,
    /// A boundary identifier could not be mapped to a revision.
    ResolutionFailed { identifier: ToolchainId },
    /// The boundaries resolved but no revisions lie between them (e.g. the
    /// working identifier is newer than the failing one).
    EmptyWindow { works: RevisionId, fails: RevisionId },
    /// Listing the revisions between the boundaries failed.
    HistoryUnavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BisectStatus {
    Skipped { skip: SkipReason },
    Searched { works: RevisionId, fails: RevisionId, search: SearchReport },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BisectReport {
    pub matrix: MatrixReport,
    pub status: BisectStatus,
}

impl BisectReport {
    /// Number of identifiers and revisions the run considered.
    pub fn revisions_considered(&self) -> usize {
        let window = match &self.status {
            BisectStatus::Searched { search, .. } => search.steps.len(),
            BisectStatus::Skipped { .. } => 0,
        };
        self.matrix.results.len() + window
    }
}

/// Drives the whole pipeline over borrowed collaborators.
pub struct Bisector<'a> {
    pub probe: &'a dyn Probe,
    pub history: &'a mut dyn RevisionHistory,
    pub search: BisectionSearch,
}

impl<'a> Bisector<'a> {
    pub fn new(probe: &'a dyn Probe, history: &'a mut dyn RevisionHistory) -> Self {
        Self { probe, history, search: BisectionSearch::default() }
    }

    pub fn with_search(mut self, search: BisectionSearch) -> Self {
        self.search = search;
        self
    }

    /// Run the matrix only.
    pub fn matrix(
        &self,
        ctx: &mut ToolchainContext<'_>,
        identifiers: &[ToolchainId],
        snippet: &str,
        extra_args: &[String],
    ) -> Result<MatrixReport, BisectError> {
        Ok(VersionMatrixRunner::new(self.probe).run(ctx, identifiers, snippet, extra_args)?)
    }

    /// Probe every identifier, then bisect the commits between the first
    /// working and the first failing one.
    pub fn bisect(
        &mut self,
        ctx: &mut ToolchainContext<'_>,
        identifiers: &[ToolchainId],
        snippet: &str,
        extra_args: &[String],
    ) -> Result<BisectReport, BisectError> {
        let matrix = self.matrix(ctx, identifiers, snippet, extra_args)?;

        let (works_id, fails_id) = match matrix.regression_window() {
            Some((works, fails)) => (works.clone(), fails.clone()),
            None => return Ok(skipped(matrix, SkipReason::NoRegressionWindow)),
        };
        info!(works = %works_id, fails = %fails_id, "regression window found");

        let Some(fails) = self.history.resolve(ctx, &fails_id) else {
            return Ok(skipped(matrix, SkipReason::ResolutionFailed { identifier: fails_id }));
        };
        let Some(works) = self.history.resolve(ctx, &works_id) else {
            return Ok(skipped(matrix, SkipReason::ResolutionFailed { identifier: works_id }));
        };

        let revisions = match self.history.between(&works, &fails) {
            Ok(revisions) => revisions,
            Err(e) => {
                warn!(error = %e, "failed to list revisions between boundaries");
                return Ok(skipped(
                    matrix,
                    SkipReason::HistoryUnavailable { message: e.to_string() },
                ));
            }
        };
        if revisions.is_empty() {
            return Ok(skipped(matrix, SkipReason::EmptyWindow { works, fails }));
        }
        info!(count = revisions.len(), "bisecting revisions");

        let search = self.search.search(
            ctx,
            self.probe,
            &mut *self.history,
            snippet,
            extra_args,
            RevisionWindow::new(revisions),
        )?;

        Ok(BisectReport { matrix, status: BisectStatus::Searched { works, fails, search } })
    }
}

fn skipped(matrix: MatrixReport, skip: SkipReason) -> BisectReport {
    warn!(?skip, "skipping commit search");
    BisectReport { matrix, status: BisectStatus::Skipped { skip } }
}
