//! Per-run mutable state.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::relocate::ledger::RollbackLedger;

/// Where the run currently is in its phase sequence.
///
/// Strictly linear within a strategy; there are no retries or skips.
/// ```text
/// archive:     Precheck → Quiesce → Exporting → Deregistering → Importing → Verifying → Cleanup
/// copy-relink: Precheck → Quiesce → Copying → BackingUp → Relinking → Verifying
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelocationPhase {
    Precheck,
    Quiesce,
    Exporting,
    Deregistering,
    Importing,
    Copying,
    BackingUp,
    Relinking,
    Verifying,
    Cleanup,
    Done,
}

impl RelocationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelocationPhase::Precheck => "precheck",
            RelocationPhase::Quiesce => "quiesce",
            RelocationPhase::Exporting => "exporting",
            RelocationPhase::Deregistering => "deregistering",
            RelocationPhase::Importing => "importing",
            RelocationPhase::Copying => "copying",
            RelocationPhase::BackingUp => "backing-up",
            RelocationPhase::Relinking => "relinking",
            RelocationPhase::Verifying => "verifying",
            RelocationPhase::Cleanup => "cleanup",
            RelocationPhase::Done => "done",
        }
    }
}

impl fmt::Display for RelocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state owned by the driver for the duration of one run.
///
/// Created at invocation, mutated phase by phase, discarded at the end;
/// nothing here survives the run except the ledger's on-disk mirror.
#[derive(Debug)]
pub struct RelocationState {
    pub phase: RelocationPhase,
    /// Set once export has produced a non-empty archive.
    pub archive_path: Option<PathBuf>,
    /// Run-scoped temp directory holding the archive.
    pub archive_dir: Option<PathBuf>,
    /// Set once the original directory has been renamed aside.
    pub backup_path: Option<PathBuf>,
    pub ledger: RollbackLedger,
}

impl RelocationState {
    pub fn new(ledger: RollbackLedger) -> Self {
        Self {
            phase: RelocationPhase::Precheck,
            archive_path: None,
            archive_dir: None,
            backup_path: None,
            ledger,
        }
    }

    pub fn set_phase(&mut self, phase: RelocationPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(RelocationPhase::BackingUp.to_string(), "backing-up");
        assert_eq!(RelocationPhase::Exporting.to_string(), "exporting");
    }

    #[test]
    fn test_fresh_state() {
        let state = RelocationState::new(RollbackLedger::new());
        assert_eq!(state.phase, RelocationPhase::Precheck);
        assert!(state.archive_path.is_none());
        assert!(state.backup_path.is_none());
        assert!(state.ledger.is_empty());
    }
}
