//! # Directory Scanner
//!
//! Walks the scan root into an ordered list of file handles. Zero-byte
//! files are skipped (they map to nothing), as is any directory whose name
//! contains `cache` - nobody wants a mountain of build artifacts in their
//! world.

use std::fs;
use std::path::Path;

use tracing::debug;

use voxfs_core::FileHandle;

use crate::error::AppResult;

/// Scans the root depth-first into handles, deterministically ordered by
/// file name at every level.
///
/// # Errors
///
/// Propagates directory read failures; an unreadable scan root is fatal.
pub fn scan_files(root: &Path) -> AppResult<Vec<FileHandle>> {
    let mut files = Vec::new();
    walk(root, 1, &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<FileHandle>) -> AppResult<()> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if name.contains("cache") {
                debug!("skipping cache directory {}", path.display());
                continue;
            }
            walk(&path, depth + 1, out)?;
        } else if metadata.is_file() && metadata.len() > 0 {
            out.push(FileHandle::new(path, metadata.len(), depth));
        }
    }
    Ok(())
}
