//! Signal-driven interruption.
//!
//! An interrupt observed between phases is handled exactly like an ordinary
//! phase failure: the driver unwinds the rollback ledger. There is no
//! mid-phase cancellation; the destructive phases are single atomic renames
//! and the long-running phases are non-destructive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{MoveError, MoveResult};

/// Shared flag raised when SIGINT/SIGTERM is delivered.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// A flag not hooked to any signal. Embedders and tests raise it manually.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook the flag to SIGINT and SIGTERM.
    pub fn register() -> std::io::Result<Self> {
        let flag = Self::new();
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag.raised))?;
        signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&flag.raised))?;
        Ok(flag)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Fail with [`MoveError::Interrupted`] if the flag is raised.
    pub fn check(&self) -> MoveResult<()> {
        if self.is_raised() {
            return Err(MoveError::Interrupted);
        }
        Ok(())
    }
}
