//! Instance manager backed by an external command.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::constants::manager::{DEFAULT_BIN, envs};
use crate::errors::{MoveResult, ToolError};
use crate::manager::InstanceManager;

/// Invokes the manager binary (`wsl` by default) and maps its exit signal.
///
/// The binary can be overridden with the `WSLMV_MANAGER` environment
/// variable or an explicit path, which is also how tests substitute a stub.
#[derive(Debug, Clone)]
pub struct CommandManager {
    bin: PathBuf,
}

impl CommandManager {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Resolve the binary from the environment, falling back to the default.
    pub fn from_env() -> Self {
        let bin = std::env::var_os(envs::WSLMV_MANAGER)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BIN));
        Self::new(bin)
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    fn run(&self, operation: &'static str, args: &[&std::ffi::OsStr]) -> MoveResult<String> {
        tracing::debug!(tool = %self.bin.display(), operation, "invoking instance manager");

        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .map_err(|e| ToolError::Spawn {
                tool: self.bin.display().to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ToolError::CommandFailed {
                tool: self.bin.display().to_string(),
                operation,
                status: output.status.to_string(),
                stderr,
            }
            .into());
        }

        // The real tool emits UTF-16LE; stripping interleaved NULs is enough
        // for the names we parse, without a full re-decode.
        Ok(String::from_utf8_lossy(&output.stdout).replace('\0', ""))
    }
}

impl InstanceManager for CommandManager {
    fn export(&self, instance: &str, archive: &Path) -> MoveResult<()> {
        self.run(
            "export",
            &[
                "--export".as_ref(),
                instance.as_ref(),
                archive.as_os_str(),
            ],
        )?;
        Ok(())
    }

    fn import(&self, instance: &str, location: &Path, archive: &Path) -> MoveResult<()> {
        self.run(
            "import",
            &[
                "--import".as_ref(),
                instance.as_ref(),
                location.as_os_str(),
                archive.as_os_str(),
            ],
        )?;
        Ok(())
    }

    fn unregister(&self, instance: &str) -> MoveResult<()> {
        self.run("unregister", &["--unregister".as_ref(), instance.as_ref()])?;
        Ok(())
    }

    fn shutdown_all(&self) -> MoveResult<()> {
        self.run("shutdown", &["--shutdown".as_ref()])?;
        Ok(())
    }

    fn list(&self) -> MoveResult<Vec<String>> {
        let stdout = self.run("list", &["--list".as_ref(), "--quiet".as_ref()])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failure_is_typed() {
        let manager = CommandManager::new("/nonexistent/wslmv-manager-bin");
        let err = manager.shutdown_all().unwrap_err();
        assert!(matches!(
            err,
            crate::errors::MoveError::Tool(ToolError::Spawn { .. })
        ));
    }

    #[test]
    fn test_nonzero_exit_is_command_failed() {
        let manager = CommandManager::new("false");
        let err = manager.shutdown_all().unwrap_err();
        match err {
            crate::errors::MoveError::Tool(ToolError::CommandFailed { operation, .. }) => {
                assert_eq!(operation, "shutdown")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_exit_is_success() {
        let manager = CommandManager::new("true");
        manager.shutdown_all().unwrap();
    }

    #[test]
    fn test_list_parses_lines() {
        // `echo` stands in for the manager; extra args become stdout lines.
        let manager = CommandManager::new("echo");
        // stdout is "--list --quiet\n"; trimming applies but this only
        // exercises the line-splitting path, not real names.
        let names = manager.list().unwrap();
        assert_eq!(names, vec!["--list --quiet".to_string()]);
    }

    #[test]
    fn test_default_bin() {
        let manager = CommandManager::new(DEFAULT_BIN);
        assert_eq!(manager.bin(), Path::new("wsl"));
    }
}
