//! bisect-core
//!
//! Core library for finding compiler regressions: probe a snippet across a
//! matrix of toolchain releases, then bisect the commit history between the
//! first working and the first failing release.
//!
//! The pipeline is strictly sequential. There is one active toolchain and one
//! history checkout; both are owned by explicit values (`ToolchainContext`,
//! `RevisionHistory` implementors) rather than global state.

pub mod model;
pub mod services;
pub mod workspace;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
