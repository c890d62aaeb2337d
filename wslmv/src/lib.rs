//! wslmv - relocate the backing storage of a disk-backed Linux subsystem
//! instance without data loss.
//!
//! Two strategies share one deterministic driver:
//! - **archive**: export to an archive via the external instance manager,
//!   deregister, re-import at the new location;
//! - **copy-relink**: copy the files verbatim, rename the original aside as
//!   a backup, substitute a symlink at the original path.
//!
//! Destructive actions record their inverses in a rollback ledger that the
//! driver unwinds in reverse on failure, so an interrupted or failed run
//! leaves the system as it was.

pub mod constants;
pub mod errors;
pub mod interrupt;
pub mod lock;
pub mod manager;
pub mod relocate;
pub mod request;
pub mod storage;

pub use errors::{MoveError, MoveResult, PreconditionError, ToolError, VerificationError};
pub use interrupt::InterruptFlag;
pub use manager::{CommandManager, InstanceManager};
pub use relocate::{
    AssumeYes, Outcome, PhaseOutcome, Privileges, Prompt, RelocationReport, Relocator,
    RollbackLedger,
};
pub use request::{RelocationRequest, Strategy};
