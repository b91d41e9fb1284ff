//! Bisect services: toolchain activation, probing, history, and the search pipeline.
//!
//! Traits (`ToolchainSwitcher`, `Probe`, `RevisionHistory`) sit at the seams to
//! external tools; `backends` holds the process-backed implementations and
//! `fakes` the in-memory ones.

pub mod backends;
pub mod bisector;
pub mod fakes;
pub mod history;
pub mod matrix;
pub mod probe;
pub mod search;
pub mod toolchain;

pub use bisector::{BisectError, BisectReport, BisectStatus, Bisector, SkipReason};
pub use history::{HistoryError, RevisionHistory};
pub use matrix::{MatrixReport, VersionMatrixRunner, VersionOutcome, VersionResult};
pub use probe::{Probe, ProbeError};
pub use search::{BisectionSearch, SearchPhase, SearchReport, SearchStep, Verdict};
pub use toolchain::{
    RetryingSwitcher, SelectError, SelectOutcome, ToolchainContext, ToolchainInstaller,
    ToolchainSwitcher, MAX_SELECT_ATTEMPTS,
};
