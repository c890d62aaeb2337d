//! The relocation orchestrator.
//!
//! One deterministic, strictly sequential driver runs both strategies:
//! precheck → confirm → quiesce → strategy phase list. Each phase's success
//! is a precondition for the next, every phase outcome is logged before the
//! next begins, and the driver is the only place the rollback ledger is
//! unwound.

mod archive;
mod copy_relink;
pub mod ledger;
mod phase;
pub mod precheck;
mod quiesce;
mod report;
mod state;

pub use ledger::{Remedy, RollbackLedger};
pub use phase::PhaseOutcome;
pub use precheck::{EuidPrivileges, PrecheckSummary, Privileges};
pub use report::{Outcome, RelocationReport};
pub use state::{RelocationPhase, RelocationState};

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{filenames, quiesce as quiesce_consts};
use crate::errors::{MoveError, MoveResult};
use crate::interrupt::InterruptFlag;
use crate::lock::{RunLock, default_lock_dir};
use crate::manager::{CommandManager, InstanceManager};
use crate::request::{RelocationRequest, Strategy};
use crate::storage::{LinkMaker, SpaceProbe, SymlinkMaker, SysinfoProbe};

use phase::{Phase, RunContext};

/// Operator confirmation seam.
///
/// Presentation lives in the CLI; the orchestrator only needs a yes/no.
pub trait Prompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Non-interactive default: proceed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Drives one relocation run.
///
/// Collaborators default to the real implementations; every seam can be
/// replaced for tests or embedding.
pub struct Relocator {
    request: RelocationRequest,
    manager: Box<dyn InstanceManager>,
    space: Box<dyn SpaceProbe>,
    privileges: Box<dyn Privileges>,
    linker: Box<dyn LinkMaker>,
    prompt: Box<dyn Prompt>,
    interrupts: InterruptFlag,
    lock_dir: PathBuf,
    grace: Duration,
    mirror_ledger: bool,
}

impl Relocator {
    pub fn new(request: RelocationRequest) -> Self {
        Self {
            request,
            manager: Box::new(CommandManager::from_env()),
            space: Box::new(SysinfoProbe),
            privileges: Box::new(EuidPrivileges),
            linker: Box::new(SymlinkMaker),
            prompt: Box::new(AssumeYes),
            interrupts: InterruptFlag::new(),
            lock_dir: default_lock_dir(),
            grace: quiesce_consts::GRACE_WAIT,
            mirror_ledger: true,
        }
    }

    pub fn with_manager(mut self, manager: impl InstanceManager + 'static) -> Self {
        self.manager = Box::new(manager);
        self
    }

    pub fn with_space_probe(mut self, probe: impl SpaceProbe + 'static) -> Self {
        self.space = Box::new(probe);
        self
    }

    pub fn with_privileges(mut self, privileges: impl Privileges + 'static) -> Self {
        self.privileges = Box::new(privileges);
        self
    }

    pub fn with_linker(mut self, linker: impl LinkMaker + 'static) -> Self {
        self.linker = Box::new(linker);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_interrupts(mut self, interrupts: InterruptFlag) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Disable the on-disk ledger mirror (in-memory ledger only).
    pub fn without_ledger_mirror(mut self) -> Self {
        self.mirror_ledger = false;
        self
    }

    /// Execute the run.
    ///
    /// Returns a report for completed and cleanly aborted runs. Failures
    /// return the causing error after the ledger (if non-empty) has been
    /// unwound; an incomplete unwind leaves the ledger mirror on disk for
    /// `rollback`.
    pub fn run(&self) -> MoveResult<RelocationReport> {
        self.request.sanitize()?;

        let _lock = RunLock::acquire(&self.lock_dir, &self.request.instance)?;

        let summary = precheck::verify(
            &self.request,
            self.space.as_ref(),
            self.privileges.as_ref(),
        )?;

        let message = format!(
            "Relocate instance '{}' from {} to {} using the {} strategy? \
             ({} required, {} free at destination)",
            self.request.instance,
            self.request.source.display(),
            self.request.target.display(),
            self.request.strategy,
            human_bytes(summary.required_bytes),
            human_bytes(summary.free_bytes),
        );
        if !self.prompt.confirm(&message) {
            tracing::info!("operator declined, stopping before any changes");
            return Ok(RelocationReport::aborted(&self.request, "operator declined"));
        }

        quiesce::quiesce(self.manager.as_ref(), self.grace)?;

        let ledger = if self.mirror_ledger {
            RollbackLedger::with_mirror(filenames::ledger_file(
                &self.lock_dir,
                &self.request.instance,
            ))
        } else {
            RollbackLedger::new()
        };
        let mut state = RelocationState::new(ledger);

        let phases = match self.request.strategy {
            Strategy::Archive => archive::phases(),
            Strategy::CopyRelink => copy_relink::phases(),
        };

        let result = self.run_phases(&phases, &mut state);

        // Temp archive cleanup runs regardless of outcome and never fails
        // the run.
        if let Some(dir) = state.archive_dir.clone() {
            state.set_phase(RelocationPhase::Cleanup);
            archive::cleanup_temp(&dir);
        }

        match result {
            Ok(PhaseOutcome::Success) => {
                state.ledger.clear();
                state.set_phase(RelocationPhase::Done);
                let report = RelocationReport::completed(&self.request, state.backup_path.clone());
                tracing::info!(
                    instance = %report.instance,
                    target = %report.target.display(),
                    "relocation complete"
                );
                Ok(report)
            }
            Ok(PhaseOutcome::Aborted(reason)) => {
                tracing::info!(reason = %reason, "relocation aborted");
                Ok(RelocationReport::aborted(&self.request, reason))
            }
            Err(e) => {
                self.rollback(&mut state, &e);
                Err(e)
            }
        }
    }

    fn run_phases(
        &self,
        phases: &[Box<dyn Phase>],
        state: &mut RelocationState,
    ) -> MoveResult<PhaseOutcome> {
        for phase in phases {
            self.interrupts.check()?;
            state.set_phase(phase.phase());
            tracing::info!(phase = phase.name(), "phase starting");

            let mut ctx = RunContext {
                request: &self.request,
                manager: self.manager.as_ref(),
                linker: self.linker.as_ref(),
                state: &mut *state,
            };
            match phase.run(&mut ctx)? {
                PhaseOutcome::Success => {
                    tracing::info!(phase = phase.name(), "phase completed");
                }
                aborted @ PhaseOutcome::Aborted(_) => return Ok(aborted),
            }
        }
        Ok(PhaseOutcome::Success)
    }

    /// Unwind the ledger when the failure class calls for it.
    fn rollback(&self, state: &mut RelocationState, cause: &MoveError) {
        if !cause.triggers_rollback() || state.ledger.is_empty() {
            tracing::error!(
                phase = %state.phase,
                error = %cause,
                "run failed; nothing destructive recorded, no rollback needed"
            );
            return;
        }

        tracing::warn!(
            phase = %state.phase,
            error = %cause,
            remedies = state.ledger.len(),
            "run failed, unwinding rollback ledger"
        );
        match state.ledger.unwind(self.manager.as_ref()) {
            Ok(()) => tracing::info!("rollback complete, system restored"),
            Err(unwind_err) => tracing::error!(
                error = %unwind_err,
                "rollback incomplete; ledger retained for 'wslmv rollback'"
            ),
        }
    }
}

/// Rough human-readable byte count for prompts.
fn human_bytes(bytes: u64) -> String {
    const GIB: u64 = 1024 * 1024 * 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(human_bytes(20 * 1024 * 1024 * 1024), "20.0 GiB");
    }
}
