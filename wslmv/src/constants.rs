//! Constants for the relocation orchestrator.
//!
//! Centralized location for hardcoded values, names, and safety margins.

/// Instance naming and data-file recognition.
pub mod instance {
    /// Default logical instance name when none is specified.
    pub const DEFAULT_NAME: &str = "Ubuntu";

    /// File extensions that identify an instance disk image.
    ///
    /// The precondition verifier requires at least one top-level entry
    /// with one of these extensions before it will touch anything.
    pub const DATA_FILE_EXTENSIONS: &[&str] = &["vhdx", "img", "qcow2", "raw"];
}

/// External instance-manager tool.
pub mod manager {
    /// Default manager binary when none is configured.
    pub const DEFAULT_BIN: &str = "wsl";

    pub mod envs {
        /// Overrides the manager binary path.
        pub const WSLMV_MANAGER: &str = "WSLMV_MANAGER";
    }
}

/// Free-space safety margins.
pub mod space {
    /// Floor applied when the source size cannot be computed cheaply: 20 GiB.
    pub const FALLBACK_MARGIN_BYTES: u64 = 20 * 1024 * 1024 * 1024;
}

/// Quiesce timing.
pub mod quiesce {
    use std::time::Duration;

    /// Grace interval after shutdown-all, letting in-flight writes settle.
    pub const GRACE_WAIT: Duration = Duration::from_secs(8);
}

/// File naming patterns.
pub mod filenames {
    use std::path::{Path, PathBuf};

    /// Extension of the exported archive file.
    pub const ARCHIVE_EXT: &str = "tar";

    /// Prefix for the run-scoped export temp directory.
    pub const EXPORT_TMP_PREFIX: &str = "wslmv-export-";

    /// Name of the on-disk rollback ledger mirror inside the lock dir.
    pub fn ledger_file(lock_dir: &Path, instance: &str) -> PathBuf {
        lock_dir.join(format!("{instance}.ledger.json"))
    }

    /// Per-instance lock file path.
    pub fn lock_file(lock_dir: &Path, instance: &str) -> PathBuf {
        lock_dir.join(format!("{instance}.lock"))
    }
}
