pub mod compiler;
pub mod git;
pub mod installer;

pub use compiler::CommandProbe;
pub use git::GitHistory;
pub use installer::{resolve_compiler_path, resolve_installer_path, CommandInstaller};
