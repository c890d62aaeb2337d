//! Per-instance run lock.
//!
//! Uses file locking (flock) to ensure only one relocation run can own a
//! given instance's source/target pair at a time. Concurrent invocations
//! against the same instance are rejected, not queued.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::constants::filenames;
use crate::errors::{MoveError, MoveResult, ToolError};

/// A lock guard holding an exclusive lock for one instance name.
///
/// The lock is released when the guard is dropped, or by the OS when the
/// process exits/crashes.
#[derive(Debug)]
pub struct RunLock {
    #[allow(dead_code)] // Held for lifetime, not directly accessed
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Attempt to acquire the exclusive lock for `instance`.
    ///
    /// # Errors
    /// * [`MoveError::Locked`] - another run already holds this instance
    /// * [`MoveError::Tool`] - the lock file could not be created or opened
    pub fn acquire(lock_dir: &Path, instance: &str) -> MoveResult<Self> {
        std::fs::create_dir_all(lock_dir)
            .map_err(|e| ToolError::fs("create lock dir", lock_dir, e))?;

        let lock_path = filenames::lock_file(lock_dir, instance);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| ToolError::fs("open lock file", &lock_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;

            let fd = file.as_raw_fd();
            let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

            if result != 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::WouldBlock {
                    return Err(MoveError::Locked(instance.to_string()));
                }
                return Err(ToolError::fs("lock", &lock_path, err).into());
            }
        }

        tracing::debug!(lock_path = %lock_path.display(), "acquired run lock");

        Ok(RunLock {
            file,
            path: lock_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = self.file.as_raw_fd();
            unsafe {
                libc::flock(fd, libc::LOCK_UN);
            }
        }

        tracing::debug!(lock_path = %self.path.display(), "released run lock");
    }
}

/// Default lock directory: `~/.wslmv/locks`, or the system temp dir when
/// no home directory can be resolved.
pub fn default_lock_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".wslmv").join("locks"))
        .unwrap_or_else(|| std::env::temp_dir().join("wslmv-locks"))
}
