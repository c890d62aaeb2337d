//! Link creation seam.
//!
//! Link creation is the one filesystem primitive the copy-relink rollback
//! path hinges on, so it sits behind a trait; tests substitute a failing
//! implementation to exercise the unwind.

use std::io;
use std::path::Path;

/// Creates the substitute link at the old instance path.
pub trait LinkMaker: Send + Sync {
    /// Create a link at `link` whose traversal resolves to `target`.
    fn make_link(&self, link: &Path, target: &Path) -> io::Result<()>;
}

/// Default implementation backed by a symbolic link.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkMaker;

impl LinkMaker for SymlinkMaker {
    #[cfg(unix)]
    fn make_link(&self, link: &Path, target: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(not(unix))]
    fn make_link(&self, _link: &Path, _target: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symlinks not supported on this platform",
        ))
    }
}
