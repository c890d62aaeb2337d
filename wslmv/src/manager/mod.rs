//! External instance-manager tool.
//!
//! The orchestrator never inspects the manager's internals; it only issues
//! operations and trusts the exit signal. The trait is the seam that lets
//! integration tests substitute a fake registry.

mod command;

pub use command::CommandManager;

use std::path::Path;

use crate::errors::MoveResult;

/// Operations the relocation phases need from the instance manager.
pub trait InstanceManager: Send + Sync {
    /// Serialize the named instance to an archive file.
    fn export(&self, instance: &str, archive: &Path) -> MoveResult<()>;

    /// Register an instance under `instance` at `location`, sourced from `archive`.
    fn import(&self, instance: &str, location: &Path, archive: &Path) -> MoveResult<()>;

    /// Remove the instance's registration.
    fn unregister(&self, instance: &str) -> MoveResult<()>;

    /// Stop every running instance. Blocking and idempotent.
    fn shutdown_all(&self) -> MoveResult<()>;

    /// Names of all registered instances.
    fn list(&self) -> MoveResult<Vec<String>>;

    /// Whether the named instance appears in the listing.
    fn is_registered(&self, instance: &str) -> MoveResult<bool> {
        Ok(self.list()?.iter().any(|name| name == instance))
    }
}
