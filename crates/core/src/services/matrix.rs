//! Version matrix: probe the snippet under every configured identifier.
//!
//! The `works`/`fails` boundaries are the *first* passing and *first* failing
//! identifiers in the order given. This is order-sensitive on purpose: two
//! non-adjacent releases can end up as the boundary pair, and no attempt is
//! made to find the most recent failing release. Sorting the identifiers
//! chronologically would change which pair is reported.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{ProbeResult, Target, ToolchainId};
use crate::services::probe::{Probe, ProbeError};
use crate::services::toolchain::{SelectOutcome, ToolchainContext};

/// What happened to one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VersionOutcome {
    Probed { result: ProbeResult },
    /// Activation exhausted its retries; the identifier is excluded from boundary selection.
    Unavailable { attempts: u32, last_error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResult {
    pub identifier: ToolchainId,
    pub started_at: String,
    pub finished_at: String,
    pub outcome: VersionOutcome,
}

impl VersionResult {
    /// `Some(success)` when probed, `None` when untestable.
    pub fn passed(&self) -> Option<bool> {
        match &self.outcome {
            VersionOutcome::Probed { result } => Some(result.success),
            VersionOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatrixReport {
    pub works: Option<ToolchainId>,
    pub fails: Option<ToolchainId>,
    pub results: Vec<VersionResult>,
}

impl MatrixReport {
    /// `(works, fails)` when the matrix found both a pass and a fail.
    pub fn regression_window(&self) -> Option<(&ToolchainId, &ToolchainId)> {
        Some((self.works.as_ref()?, self.fails.as_ref()?))
    }
}

pub struct VersionMatrixRunner<'a> {
    pub probe: &'a dyn Probe,
}

impl<'a> VersionMatrixRunner<'a> {
    pub fn new(probe: &'a dyn Probe) -> Self {
        Self { probe }
    }

    /// Probe every identifier in order. The full matrix always runs, even once
    /// both boundaries are known.
    pub fn run(
        &self,
        ctx: &mut ToolchainContext<'_>,
        identifiers: &[ToolchainId],
        snippet: &str,
        extra_args: &[String],
    ) -> Result<MatrixReport, ProbeError> {
        let mut report = MatrixReport::default();

        for identifier in identifiers {
            let started_at = Utc::now().to_rfc3339();
            let outcome = match ctx.select(&Target::Toolchain(identifier.clone())) {
                SelectOutcome::Active { .. } => {
                    let result = self.probe.run(ctx, snippet, extra_args)?;
                    VersionOutcome::Probed { result }
                }
                SelectOutcome::Unavailable { attempts, last_error, .. } => {
                    VersionOutcome::Unavailable { attempts, last_error }
                }
            };
            let entry = VersionResult {
                identifier: identifier.clone(),
                started_at,
                finished_at: Utc::now().to_rfc3339(),
                outcome,
            };

            match entry.passed() {
                Some(true) if report.works.is_none() => report.works = Some(identifier.clone()),
                Some(false) if report.fails.is_none() => report.fails = Some(identifier.clone()),
                _ => {}
            }
            info!(
                identifier = %identifier,
                passed = ?entry.passed(),
                "matrix entry finished"
            );
            report.results.push(entry);
        }

        Ok(report)
    }
}
