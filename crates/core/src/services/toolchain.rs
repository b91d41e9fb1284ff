//! Toolchain activation.
//!
//! There is exactly one active toolchain at a time. Instead of process-global
//! state, the active slot lives in a [`ToolchainContext`] value that every
//! activating or probing operation borrows, so two activations can never be in
//! flight at once.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{RevisionId, Target};

/// Attempts made per `select` before reporting the target unavailable.
pub const MAX_SELECT_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("failed to spawn installer: {0}")]
    Spawn(String),
    #[error("installer exited with {status}: {output}")]
    Failed { status: String, output: String },
}

/// Result of a `select` call. Unavailability is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectOutcome {
    Active { target: Target },
    Unavailable { target: Target, attempts: u32, last_error: String },
}

impl SelectOutcome {
    pub fn is_active(&self) -> bool {
        matches!(self, SelectOutcome::Active { .. })
    }
}

/// Activates toolchain identifiers and revisions.
pub trait ToolchainSwitcher {
    /// Install or activate `target`, replacing whatever was active.
    fn select(&self, target: &Target) -> SelectOutcome;

    /// Read the revision the active toolchain reports it was built from.
    fn reported_revision(&self) -> Option<RevisionId>;
}

/// Single install attempt, wrapped by [`RetryingSwitcher`].
pub trait ToolchainInstaller {
    /// One attempt at activating `target`. Returns the installer's output.
    fn install(&self, target: &Target) -> Result<String, SelectError>;

    fn reported_revision(&self) -> Option<RevisionId>;
}

/// Switcher that retries an installer up to [`MAX_SELECT_ATTEMPTS`] times, with no backoff.
pub struct RetryingSwitcher<I> {
    installer: I,
}

impl<I: ToolchainInstaller> RetryingSwitcher<I> {
    pub fn new(installer: I) -> Self {
        Self { installer }
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }
}

impl<I: ToolchainInstaller> ToolchainSwitcher for RetryingSwitcher<I> {
    fn select(&self, target: &Target) -> SelectOutcome {
        let mut last_error = String::new();
        for attempt in 1..=MAX_SELECT_ATTEMPTS {
            match self.installer.install(target) {
                Ok(output) => {
                    debug!(%target, attempt, output = %output.trim(), "toolchain activated");
                    return SelectOutcome::Active { target: target.clone() };
                }
                Err(e) => {
                    warn!(%target, attempt, error = %e, "toolchain activation failed");
                    last_error = e.to_string();
                }
            }
        }
        warn!(%target, "giving up after {} attempts", MAX_SELECT_ATTEMPTS);
        SelectOutcome::Unavailable {
            target: target.clone(),
            attempts: MAX_SELECT_ATTEMPTS,
            last_error,
        }
    }

    fn reported_revision(&self) -> Option<RevisionId> {
        self.installer.reported_revision()
    }
}

/// Owner of the single active-toolchain slot.
///
/// Activation goes through `&mut self`, so the borrow checker serializes every
/// switch against every probe that reads the slot.
pub struct ToolchainContext<'a> {
    switcher: &'a dyn ToolchainSwitcher,
    active: Option<Target>,
    activations: u64,
}

impl<'a> ToolchainContext<'a> {
    pub fn new(switcher: &'a dyn ToolchainSwitcher) -> Self {
        Self { switcher, active: None, activations: 0 }
    }

    /// Activate `target`. On unavailability the slot is cleared: a failed
    /// install may have left the previous toolchain half-replaced.
    pub fn select(&mut self, target: &Target) -> SelectOutcome {
        let outcome = self.switcher.select(target);
        self.activations += 1;
        match &outcome {
            SelectOutcome::Active { target } => {
                info!(%target, "active toolchain");
                self.active = Some(target.clone());
            }
            SelectOutcome::Unavailable { .. } => self.active = None,
        }
        outcome
    }

    pub fn active(&self) -> Option<&Target> {
        self.active.as_ref()
    }

    /// Number of `select` calls made through this context.
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Revision reported by the active toolchain itself.
    pub fn reported_revision(&self) -> Option<RevisionId> {
        self.active.as_ref()?;
        self.switcher.reported_revision()
    }
}

/// Extract the revision from compiler version output.
///
/// Looks for the first non-empty line starting with `prefix` (case-insensitive),
/// e.g. `git hash: 8e5c3c8f...`.
pub fn parse_reported_revision(version_output: &str, prefix: &str) -> Option<RevisionId> {
    let prefix = prefix.trim().to_lowercase();
    version_output
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix(&prefix).map(|rest| rest.trim().to_string()))
        .filter(|hash| !hash.is_empty())
        .map(RevisionId::new)
}
