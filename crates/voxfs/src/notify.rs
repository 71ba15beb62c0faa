//! # Divergence Notification
//!
//! When a decoded block no longer matches its mapping entry, the entry is
//! gone from the world - someone mined it. The file-lifecycle collaborator
//! behind this trait decides what happens to the file itself; the core only
//! reports.

use voxfs_core::{BlockSpec, Coordinate, FileHandle};

/// One observed divergence between the mapping and the world on disk.
#[derive(Clone, Debug)]
pub struct DivergenceEvent {
    /// Where the mismatch was observed.
    pub position: Coordinate,
    /// The block the mapping recorded.
    pub expected: BlockSpec,
    /// The block actually decoded (air when the cell was empty).
    pub observed: BlockSpec,
    /// The filesystem entry the block stood for.
    pub file: FileHandle,
}

/// The file-lifecycle collaborator's seam.
pub trait FileLifecycle: Send + Sync {
    /// Called once per divergence, after the entry has been removed from
    /// the mapping.
    fn on_divergence(&self, event: &DivergenceEvent);
}

/// The shipped lifecycle: prints the divergence lines and leaves the file
/// alone.
#[derive(Clone, Debug)]
pub struct LoggingLifecycle {
    /// Short-parent depth used to abbreviate the reported path.
    pub group_depth: usize,
}

impl FileLifecycle for LoggingLifecycle {
    fn on_divergence(&self, event: &DivergenceEvent) {
        let mut short = event.file.short_parent(self.group_depth);
        if let Some(name) = event.file.path.file_name() {
            short.push(name);
        }
        println!(
            "Removed \"{}\" at ({}): \"{}\"",
            event.expected,
            event.position.key(),
            short.display()
        );
        println!("^ Replaced by \"{}\"", event.observed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_logging_lifecycle_is_callable() {
        let lifecycle = LoggingLifecycle { group_depth: 1 };
        lifecycle.on_divergence(&DivergenceEvent {
            position: Coordinate::new(1, 2, 3),
            expected: BlockSpec::grass_block(),
            observed: BlockSpec::air(),
            file: FileHandle::new(PathBuf::from("/scan/a/b/c.txt"), 10, 3),
        });
    }
}
