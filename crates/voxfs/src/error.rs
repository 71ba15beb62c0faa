//! # Application Error Types

use thiserror::Error;

/// Errors that can occur at the application layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or unreadable configuration - fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Mapping-layer failure.
    #[error(transparent)]
    Core(#[from] voxfs_core::CoreError),

    /// Codec-layer failure.
    #[error(transparent)]
    Anvil(#[from] voxfs_anvil::AnvilError),

    /// A spawned flush task failed to join.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
