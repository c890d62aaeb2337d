//! Size and free-space queries.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Path;

use walkdir::WalkDir;

use crate::errors::{MoveResult, ToolError};

/// Reports the free space of the volume backing a path.
///
/// A seam rather than a direct `sysinfo` call so the precondition verifier
/// can be tested against volumes that do not exist on the test machine.
pub trait SpaceProbe: Send + Sync {
    /// Free bytes on the volume backing `path`, or `None` when no volume
    /// can be resolved for it.
    fn free_space(&self, path: &Path) -> Option<u64>;
}

/// Real probe backed by the system disk list.
///
/// Resolves a path to the disk with the longest mount-point prefix, the
/// same way the kernel would route the write. Containers sometimes expose
/// an empty disk list, so an unresolved path falls back to `statvfs`.
#[derive(Debug, Default)]
pub struct SysinfoProbe;

impl SpaceProbe for SysinfoProbe {
    fn free_space(&self, path: &Path) -> Option<u64> {
        let disks = sysinfo::Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
            .or_else(|| statvfs_available(path))
    }
}

#[cfg(unix)]
fn statvfs_available(path: &Path) -> Option<u64> {
    use std::os::unix::ffi::OsStrExt;

    let cpath = std::ffi::CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(cpath.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }
    Some(stat.f_bavail as u64 * stat.f_frsize as u64)
}

#[cfg(not(unix))]
fn statvfs_available(_path: &Path) -> Option<u64> {
    None
}

/// Sum of file sizes under `root`, not following symlinks.
///
/// # Errors
/// Fails on the first unreadable entry; the caller falls back to the fixed
/// safety floor in that case.
pub fn dir_size(root: &Path) -> MoveResult<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            ToolError::fs("walk", path, e.into())
        })?;
        if entry.file_type().is_file() {
            let meta = entry
                .metadata()
                .map_err(|e| ToolError::fs("stat", entry.path().to_path_buf(), e.into()))?;
            total = total.saturating_add(meta.len());
        }
    }
    Ok(total)
}

/// Number of regular files reachable under `root`.
///
/// The root is canonicalized first so that counting "through" a directory
/// symlink compares the linked content, not the link itself.
pub fn count_files(root: &Path) -> MoveResult<usize> {
    let root = root
        .canonicalize()
        .map_err(|e| ToolError::fs("canonicalize", root, e))?;
    let mut count = 0usize;
    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.clone());
            ToolError::fs("walk", path, e.into())
        })?;
        if entry.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Top-level entry names of a directory, sorted.
pub fn top_level_names(dir: &Path) -> MoveResult<BTreeSet<OsString>> {
    let mut names = BTreeSet::new();
    let entries = std::fs::read_dir(dir).map_err(|e| ToolError::fs("read dir", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ToolError::fs("read dir entry", dir, e))?;
        names.insert(entry.file_name());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dir_size_sums_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), vec![0u8; 100]).unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/b"), vec![0u8; 50]).unwrap();

        assert_eq!(dir_size(temp.path()).unwrap(), 150);
    }

    #[test]
    fn test_dir_size_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        assert!(dir_size(&temp.path().join("nope")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_count_files_through_link() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("a"), b"1").unwrap();
        fs::write(real.join("b"), b"2").unwrap();

        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(count_files(&link).unwrap(), 2);
        assert_eq!(count_files(&real).unwrap(), 2);
    }

    #[test]
    fn test_top_level_names() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ext4.vhdx"), b"x").unwrap();
        fs::create_dir(temp.path().join("meta")).unwrap();

        let names = top_level_names(temp.path()).unwrap();
        assert!(names.contains(&OsString::from("ext4.vhdx")));
        assert!(names.contains(&OsString::from("meta")));
        assert_eq!(names.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_sysinfo_probe_resolves_root() {
        // "/" is always backed by some volume; the statvfs fallback covers
        // environments whose disk list comes up empty.
        assert!(SysinfoProbe.free_space(Path::new("/")).is_some());
    }
}
