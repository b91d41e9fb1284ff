//! Workspace configuration and on-disk layout.
//!
//! A workspace is a directory holding:
//! - `bisect.yaml`: the [`BisectConfig`] (version list, release table, tool commands).
//! - `.bisect/`: scratch space for the materialized snippet, build artifacts and reports.
//! - the toolchain's history checkout (default `.bisect/Nim`).

mod config;
mod context;
mod layout;
mod util;

pub use config::{
    BisectConfig, CompilerConfig, InstallerConfig, RepositoryConfig, SearchConfig, CONFIG_VERSION,
};
pub use context::WorkspaceContext;
pub use layout::WorkspaceLayout;
pub use util::{load_config, load_config_from, parse_config, write_config};
