//! # File Handles
//!
//! The immutable record a scanned filesystem entry travels through the
//! system as. The derived short parent path is what groups files into
//! terrain-generation batches.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One scanned filesystem entry.
///
/// Immutable once created; `depth` counts path components below the scan
/// root (a file directly inside the root has depth 1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes. Zero-byte files never enter the system.
    pub size: u64,
    /// Component count below the scan root.
    pub depth: usize,
}

impl FileHandle {
    /// Creates a new handle.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, depth: usize) -> Self {
        Self { path, size, depth }
    }

    /// The parent path truncated to `group_depth` components below the scan
    /// root.
    ///
    /// Two handles with equal short parents belong to the same generation
    /// group. With `group_depth = 1` every top-level directory under the
    /// scan root forms one group.
    #[must_use]
    pub fn short_parent(&self, group_depth: usize) -> PathBuf {
        let parent = self.path.parent().unwrap_or_else(|| Path::new(""));
        let components: Vec<_> = parent.components().collect();
        // `depth - 1` components of the parent lie below the scan root; the
        // rest are the root itself and must always be kept.
        let below_root = self.depth.saturating_sub(1);
        let root_len = components.len().saturating_sub(below_root);
        let keep = root_len + group_depth.min(below_root);
        components.iter().take(keep).collect()
    }
}
