//! Quiesce step.
//!
//! Copying or exporting a live, mounted disk image risks corruption, so
//! every run shuts down all instances first and then waits a fixed grace
//! interval for in-flight writes to settle. Non-destructive; no ledger entry.

use std::time::Duration;

use crate::errors::{MoveError, MoveResult};
use crate::manager::InstanceManager;

/// Stop all running instances and let writes settle.
///
/// A shutdown failure is non-fatal when the manager's listing is empty,
/// since there was nothing to stop. Any other failure propagates.
pub fn quiesce(manager: &dyn InstanceManager, grace: Duration) -> MoveResult<()> {
    match manager.shutdown_all() {
        Ok(()) => tracing::info!("instances shut down"),
        Err(MoveError::Tool(tool_err)) => {
            let nothing_running = matches!(manager.list(), Ok(names) if names.is_empty());
            if nothing_running {
                tracing::warn!(error = %tool_err, "shutdown failed but nothing is registered, continuing");
            } else {
                return Err(MoveError::Tool(tool_err));
            }
        }
        Err(other) => return Err(other),
    }

    if !grace.is_zero() {
        tracing::debug!(grace_secs = grace.as_secs(), "waiting for writes to settle");
        std::thread::sleep(grace);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolError;
    use std::path::Path;
    use std::sync::Mutex;

    struct ScriptedManager {
        shutdown_fails: bool,
        registered: Vec<String>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl InstanceManager for ScriptedManager {
        fn export(&self, _: &str, _: &Path) -> MoveResult<()> {
            unreachable!()
        }
        fn import(&self, _: &str, _: &Path, _: &Path) -> MoveResult<()> {
            unreachable!()
        }
        fn unregister(&self, _: &str) -> MoveResult<()> {
            unreachable!()
        }
        fn shutdown_all(&self) -> MoveResult<()> {
            self.calls.lock().unwrap().push("shutdown");
            if self.shutdown_fails {
                return Err(ToolError::CommandFailed {
                    tool: "wsl".into(),
                    operation: "shutdown",
                    status: "exit status: 1".into(),
                    stderr: "service unavailable".into(),
                }
                .into());
            }
            Ok(())
        }
        fn list(&self) -> MoveResult<Vec<String>> {
            self.calls.lock().unwrap().push("list");
            Ok(self.registered.clone())
        }
    }

    #[test]
    fn test_quiesce_success() {
        let manager = ScriptedManager {
            shutdown_fails: false,
            registered: vec!["Ubuntu".into()],
            calls: Mutex::new(Vec::new()),
        };
        quiesce(&manager, Duration::ZERO).unwrap();
        assert_eq!(*manager.calls.lock().unwrap(), vec!["shutdown"]);
    }

    #[test]
    fn test_shutdown_failure_nonfatal_when_nothing_registered() {
        let manager = ScriptedManager {
            shutdown_fails: true,
            registered: vec![],
            calls: Mutex::new(Vec::new()),
        };
        quiesce(&manager, Duration::ZERO).unwrap();
    }

    #[test]
    fn test_shutdown_failure_fatal_with_instances() {
        let manager = ScriptedManager {
            shutdown_fails: true,
            registered: vec!["Ubuntu".into()],
            calls: Mutex::new(Vec::new()),
        };
        let err = quiesce(&manager, Duration::ZERO).unwrap_err();
        assert!(matches!(err, MoveError::Tool(_)));
    }
}
