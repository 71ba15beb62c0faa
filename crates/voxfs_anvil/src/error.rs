//! # Codec Error Types
//!
//! Only conditions the caller can act on become errors; corrupted chunks and
//! oversized payloads are recovered inside the codec and never surface here.

use thiserror::Error;

use voxfs_core::RegionCoord;

/// Errors that can occur in the region codec layer.
#[derive(Error, Debug)]
pub enum AnvilError {
    /// Region file missing or unreadable - fatal to the surrounding run.
    #[error("region i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// File too small to even hold the header table.
    #[error("region file truncated: {len} bytes, header needs {expected}")]
    Truncated {
        /// Actual byte count.
        len: usize,
        /// Minimum byte count for a valid region file.
        expected: usize,
    },

    /// An operation referenced a region that was never loaded into the cache.
    #[error("region ({0}) is not loaded")]
    NotLoaded(RegionCoord),

    /// Malformed NBT tag tree.
    #[error("nbt parse error: {0}")]
    Nbt(String),
}

/// Result type for codec operations.
pub type AnvilResult<T> = Result<T, AnvilError>;
