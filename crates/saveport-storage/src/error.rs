//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

/// Storage-specific error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// Save path escapes the archive or is not relative
    #[error("invalid save path: {0}")]
    InvalidPath(String),

    /// A single-file save source was handed a multi-file list
    #[error("source stores a single save file, got {count}")]
    SingleFileKind {
        /// Number of files in the rejected list
        count: usize,
    },

    /// The cartridge bus is not available on this host
    #[error("no cartridge bus configured")]
    NoCartridgeBus,

    /// A ROM image was too short or malformed to carry a save
    #[error("unusable ROM image: {0}")]
    BadRom(PathBuf),

    /// Journal entry text was not a 64-character hex hash
    #[error("malformed journal value: {0:?}")]
    MalformedJournalValue(String),

    /// Cartridge access failed
    #[error(transparent)]
    Cart(#[from] saveport_cart::CartError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
