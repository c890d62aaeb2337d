//! Filesystem primitives consumed by the relocation phases.
//!
//! The orchestrator treats the filesystem as an external collaborator;
//! everything fallible here surfaces as a [`ToolError`](crate::errors::ToolError).

mod copy;
mod link;
mod space;

pub use copy::{copy_dir_recursive, remove_dir_best_effort};
pub use link::{LinkMaker, SymlinkMaker};
pub use space::{SpaceProbe, SysinfoProbe, count_files, dir_size, top_level_names};

use std::fs;
use std::path::Path;

use crate::errors::{MoveResult, ToolError};

/// Rename a directory, mapping the failure to a tool error.
///
/// Rename is atomic on the filesystems this tool targets, which is what
/// makes the backup and rollback steps safe.
pub fn rename_dir(from: &Path, to: &Path) -> MoveResult<()> {
    fs::rename(from, to).map_err(|e| ToolError::fs("rename", from, e))?;
    tracing::debug!(from = %from.display(), to = %to.display(), "renamed directory");
    Ok(())
}
