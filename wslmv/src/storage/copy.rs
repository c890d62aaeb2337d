//! Recursive directory copy.
//!
//! The copy is non-destructive to the source; a failed copy leaves at most
//! a partial destination tree for the caller to clean up.

use std::path::Path;

use rayon::prelude::*;

use crate::errors::{MoveResult, ToolError};

/// Recursively copy the contents of `src` into `dst` (parallelized).
///
/// Handles files, directories, and symlinks; symlinks are recreated with
/// their original targets rather than followed. Other file types (sockets,
/// device nodes) are skipped. `dst` is created if absent.
///
/// # Arguments
/// * `src` - Existing source directory
/// * `dst` - Destination directory (created if missing)
///
/// # Errors
/// Returns a [`ToolError::Fs`] naming the first path that failed.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> MoveResult<()> {
    if !src.is_dir() {
        return Err(ToolError::fs(
            "copy",
            src,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source is not a directory"),
        )
        .into());
    }

    std::fs::create_dir_all(dst).map_err(|e| ToolError::fs("create dir", dst, e))?;

    copy_level(src, dst)?;
    tracing::debug!(src = %src.display(), dst = %dst.display(), "copied directory tree");
    Ok(())
}

/// Copy one directory level, recursing into subdirectories.
///
/// Entries within a level are copied in parallel; file copies are I/O bound
/// and benefit the most.
fn copy_level(src: &Path, dst: &Path) -> MoveResult<()> {
    let entries: Vec<_> = std::fs::read_dir(src)
        .map_err(|e| ToolError::fs("read dir", src, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ToolError::fs("read dir entry", src, e))?;

    entries.par_iter().try_for_each(|entry| -> MoveResult<()> {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| ToolError::fs("stat", &src_path, e))?;

        if file_type.is_symlink() {
            let link_target = std::fs::read_link(&src_path)
                .map_err(|e| ToolError::fs("read link", &src_path, e))?;
            let _ = std::fs::remove_file(&dst_path);
            make_symlink_raw(&link_target, &dst_path)
                .map_err(|e| ToolError::fs("symlink", &dst_path, e))?;
        } else if file_type.is_dir() {
            std::fs::create_dir_all(&dst_path)
                .map_err(|e| ToolError::fs("create dir", &dst_path, e))?;
            copy_level(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path)
                .map_err(|e| ToolError::fs("copy file", &src_path, e))?;
        }

        Ok(())
    })
}

#[cfg(unix)]
fn make_symlink_raw(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_symlink_raw(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks not supported on this platform",
    ))
}

/// Remove a directory tree, logging instead of failing.
///
/// Used to clean up a partial destination copy after a failed copy phase;
/// the failure being reported is the copy error, not the cleanup.
pub fn remove_dir_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial copy"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial copy"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_copy_nested_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("sub/deep")).unwrap();
        fs::write(src.join("ext4.vhdx"), b"disk").unwrap();
        fs::write(src.join("sub/deep/file"), b"payload").unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("ext4.vhdx")).unwrap(), b"disk");
        assert_eq!(fs::read(dst.join("sub/deep/file")).unwrap(), b"payload");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_preserves_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("real"), b"x").unwrap();
        std::os::unix::fs::symlink("real", src.join("alias")).unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        let copied = dst.join("alias");
        assert!(copied.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&copied).unwrap(), Path::new("real"));
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let result = copy_dir_recursive(&temp.path().join("nope"), &temp.path().join("dst"));
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_dir_best_effort_ignores_missing() {
        let temp = TempDir::new().unwrap();
        // Missing path and a real tree both return without panicking.
        remove_dir_best_effort(&temp.path().join("nope"));

        let dir = temp.path().join("real");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("f"), b"x").unwrap();
        remove_dir_best_effort(&dir);
        assert!(!dir.exists());
    }
}
