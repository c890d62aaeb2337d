//! Phase abstraction.
//!
//! A strategy is an ordered list of phases. Each phase declares one forward
//! action; its inverse, when it has one, is pushed onto the rollback ledger
//! from inside `run` before the forward action executes. Phases never
//! invoke rollback themselves; only the driver does.

use crate::errors::MoveResult;
use crate::manager::InstanceManager;
use crate::relocate::state::{RelocationPhase, RelocationState};
use crate::request::RelocationRequest;
use crate::storage::LinkMaker;

/// What a completed phase reports back to the driver.
///
/// Failures travel as `Err`; `Aborted` means the operator (or a safety
/// check that found nothing destructive done yet) chose to stop cleanly.
#[derive(Debug, PartialEq, Eq)]
pub enum PhaseOutcome {
    Success,
    Aborted(String),
}

/// Everything a phase may touch during its forward action.
///
/// Interrupts are observed by the driver between phases, not in here.
pub struct RunContext<'a> {
    pub request: &'a RelocationRequest,
    pub manager: &'a dyn InstanceManager,
    pub linker: &'a dyn LinkMaker,
    pub state: &'a mut RelocationState,
}

/// One step of a strategy's phase sequence.
pub trait Phase {
    /// Human-readable name used in the audit trail.
    fn name(&self) -> &'static str;

    /// State-machine position this phase runs under.
    fn phase(&self) -> RelocationPhase;

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome>;
}
