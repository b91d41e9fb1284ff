//! Compile-and-run probes.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::ProbeResult;
use crate::services::toolchain::ToolchainContext;

/// Infrastructure faults while probing. A snippet that fails to compile or
/// run is *not* an error; it is a `ProbeResult` with `success == false`.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to write snippet to {path}: {source}")]
    WriteSnippet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to prepare {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a fixed snippet under whatever toolchain the context has active.
pub trait Probe {
    fn run(
        &self,
        ctx: &ToolchainContext<'_>,
        snippet: &str,
        extra_args: &[String],
    ) -> Result<ProbeResult, ProbeError>;
}
