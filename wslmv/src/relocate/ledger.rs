//! Rollback ledger: ordered record of inverse actions.
//!
//! Every destructive phase pushes the inverse of its action before
//! performing it, so a failure anywhere later unwinds in strict reverse
//! order. The ledger is mirrored to a JSON file while destructive actions
//! are pending; a crashed run leaves the mirror behind for `wslmv rollback`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{MoveError, MoveResult, ToolError};
use crate::manager::InstanceManager;
use crate::storage;

/// One recorded inverse action.
///
/// `RenameBack` is a true undo. `ReimportArchive` is a recovery artifact:
/// deregistration cannot be undone in place, so the remedy re-imports the
/// exported archive at the original location instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remedy {
    RenameBack {
        from: PathBuf,
        to: PathBuf,
    },
    ReimportArchive {
        archive: PathBuf,
        instance: String,
        location: PathBuf,
    },
}

impl Remedy {
    pub fn describe(&self) -> String {
        match self {
            Remedy::RenameBack { from, to } => {
                format!("rename {} back to {}", from.display(), to.display())
            }
            Remedy::ReimportArchive {
                archive,
                instance,
                location,
            } => format!(
                "re-import '{}' at {} from {}",
                instance,
                location.display(),
                archive.display()
            ),
        }
    }

    /// Apply the inverse action.
    pub fn apply(&self, manager: &dyn InstanceManager) -> MoveResult<()> {
        match self {
            Remedy::RenameBack { from, to } => {
                // A half-finished relink may have left a symlink at the
                // original path; it must go before the rename can land.
                if let Ok(meta) = to.symlink_metadata()
                    && meta.file_type().is_symlink()
                {
                    std::fs::remove_file(to).map_err(|e| ToolError::fs("remove link", to, e))?;
                }
                storage::rename_dir(from, to)
            }
            Remedy::ReimportArchive {
                archive,
                instance,
                location,
            } => manager.import(instance, location, archive),
        }
    }
}

/// Ordered list of pending remedies, unwound in reverse on failure.
#[derive(Debug, Default)]
pub struct RollbackLedger {
    entries: Vec<Remedy>,
    mirror: Option<PathBuf>,
}

impl RollbackLedger {
    /// In-memory only ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger mirrored to `path` whenever entries change.
    pub fn with_mirror(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            mirror: Some(path.into()),
        }
    }

    /// Load a leftover mirror from a crashed run.
    pub fn load(path: &Path) -> MoveResult<Self> {
        let data = std::fs::read(path).map_err(|e| ToolError::fs("read ledger", path, e))?;
        let entries: Vec<Remedy> = serde_json::from_slice(&data).map_err(|e| {
            ToolError::fs(
                "parse ledger",
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        Ok(Self {
            entries,
            mirror: Some(path.to_path_buf()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Remedy] {
        &self.entries
    }

    /// Record a remedy. Called before the forward action it reverses.
    pub fn push(&mut self, remedy: Remedy) -> MoveResult<()> {
        tracing::debug!(remedy = %remedy.describe(), "recording rollback remedy");
        self.entries.push(remedy);
        self.persist()
    }

    /// Unwind all recorded remedies in reverse order.
    ///
    /// Stops at the first remedy that fails: later inverses can depend on
    /// earlier ones (rename chains), so continuing past a failure could make
    /// things worse. The failed remedy and everything before it stay in the
    /// ledger (and its mirror) for a manual `rollback` retry.
    pub fn unwind(&mut self, manager: &dyn InstanceManager) -> MoveResult<()> {
        while let Some(remedy) = self.entries.last().cloned() {
            tracing::info!(remedy = %remedy.describe(), "applying rollback remedy");
            if let Err(e) = remedy.apply(manager) {
                tracing::error!(remedy = %remedy.describe(), error = %e, "rollback remedy failed");
                self.persist()?;
                return Err(e);
            }
            self.entries.pop();
            self.persist()?;
        }
        self.discard_mirror();
        Ok(())
    }

    /// Drop all entries and the on-disk mirror after a successful run.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.discard_mirror();
    }

    fn persist(&self) -> MoveResult<()> {
        let Some(mirror) = &self.mirror else {
            return Ok(());
        };
        if self.entries.is_empty() {
            return Ok(());
        }
        if let Some(parent) = mirror.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolError::fs("create ledger dir", parent, e))?;
        }
        let data = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
            MoveError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        std::fs::write(mirror, data).map_err(|e| ToolError::fs("write ledger", mirror, e))?;
        Ok(())
    }

    fn discard_mirror(&self) {
        if let Some(mirror) = &self.mirror
            && mirror.exists()
            && let Err(e) = std::fs::remove_file(mirror)
        {
            tracing::warn!(path = %mirror.display(), error = %e, "failed to remove ledger mirror");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Manager stub for remedies that never touch the manager.
    struct NoManager;

    impl InstanceManager for NoManager {
        fn export(&self, _: &str, _: &Path) -> MoveResult<()> {
            unreachable!("not used")
        }
        fn import(&self, _: &str, _: &Path, _: &Path) -> MoveResult<()> {
            unreachable!("not used")
        }
        fn unregister(&self, _: &str) -> MoveResult<()> {
            unreachable!("not used")
        }
        fn shutdown_all(&self) -> MoveResult<()> {
            unreachable!("not used")
        }
        fn list(&self) -> MoveResult<Vec<String>> {
            unreachable!("not used")
        }
    }

    #[test]
    fn test_unwind_reverses_a_rename_chain() {
        // Forward: A -> B, then B -> C. Unwinding in any order other than
        // C -> B, B -> A would fail, which is exactly what this asserts.
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let c = temp.path().join("c");
        fs::create_dir(&a).unwrap();
        fs::write(a.join("f"), b"x").unwrap();

        let mut ledger = RollbackLedger::new();
        ledger
            .push(Remedy::RenameBack {
                from: b.clone(),
                to: a.clone(),
            })
            .unwrap();
        fs::rename(&a, &b).unwrap();
        ledger
            .push(Remedy::RenameBack {
                from: c.clone(),
                to: b.clone(),
            })
            .unwrap();
        fs::rename(&b, &c).unwrap();

        ledger.unwind(&NoManager).unwrap();

        assert!(ledger.is_empty());
        assert_eq!(fs::read(a.join("f")).unwrap(), b"x");
        assert!(!b.exists());
        assert!(!c.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unwind_removes_stale_symlink() {
        let temp = TempDir::new().unwrap();
        let backup = temp.path().join("backup");
        let original = temp.path().join("original");
        let elsewhere = temp.path().join("elsewhere");
        fs::create_dir(&backup).unwrap();
        fs::write(backup.join("f"), b"x").unwrap();
        fs::create_dir(&elsewhere).unwrap();
        std::os::unix::fs::symlink(&elsewhere, &original).unwrap();

        let mut ledger = RollbackLedger::new();
        ledger
            .push(Remedy::RenameBack {
                from: backup.clone(),
                to: original.clone(),
            })
            .unwrap();

        ledger.unwind(&NoManager).unwrap();

        assert!(original.is_dir());
        assert!(
            !original
                .symlink_metadata()
                .unwrap()
                .file_type()
                .is_symlink()
        );
        assert_eq!(fs::read(original.join("f")).unwrap(), b"x");
    }

    #[test]
    fn test_failed_remedy_stays_in_ledger() {
        let temp = TempDir::new().unwrap();
        // `from` does not exist, so the rename remedy must fail.
        let mut ledger = RollbackLedger::new();
        ledger
            .push(Remedy::RenameBack {
                from: temp.path().join("ghost"),
                to: temp.path().join("anywhere"),
            })
            .unwrap();

        assert!(ledger.unwind(&NoManager).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_mirror_round_trip() {
        let temp = TempDir::new().unwrap();
        let mirror = temp.path().join("ledger.json");

        let mut ledger = RollbackLedger::with_mirror(&mirror);
        let remedy = Remedy::ReimportArchive {
            archive: PathBuf::from("/tmp/u.tar"),
            instance: "Ubuntu".into(),
            location: PathBuf::from("/data/old"),
        };
        ledger.push(remedy.clone()).unwrap();
        assert!(mirror.exists());

        let loaded = RollbackLedger::load(&mirror).unwrap();
        assert_eq!(loaded.entries(), &[remedy]);
    }

    #[test]
    fn test_clear_discards_mirror() {
        let temp = TempDir::new().unwrap();
        let mirror = temp.path().join("ledger.json");

        let mut ledger = RollbackLedger::with_mirror(&mirror);
        ledger
            .push(Remedy::RenameBack {
                from: PathBuf::from("/a"),
                to: PathBuf::from("/b"),
            })
            .unwrap();
        assert!(mirror.exists());

        ledger.clear();
        assert!(!mirror.exists());
        assert!(ledger.is_empty());
    }
}
