//! # Core Error Types
//!
//! Errors raised by the mapping and its snapshot persistence.

use thiserror::Error;

use crate::coord::Coordinate;

/// Errors that can occur in the core mapping layer.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A second entry was inserted at an already-mapped position.
    #[error("duplicate entry at position ({0})")]
    DuplicatePosition(Coordinate),

    /// An operation referenced a position with no entry.
    #[error("no entry at position ({0})")]
    MissingEntry(Coordinate),

    /// A relocation targeted an occupied position.
    #[error("relocation target ({0}) is occupied")]
    OccupiedTarget(Coordinate),

    /// The persisted snapshot could not be decoded.
    #[error("malformed mapping snapshot: {0}")]
    MalformedSnapshot(String),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
