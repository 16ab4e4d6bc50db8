//! Bundle error types

use thiserror::Error;

/// Bundle-specific error type
#[derive(Debug, Error)]
pub enum BundleError {
    /// Invalid bundle magic bytes
    #[error("invalid bundle magic: expected [33 44 53 53], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported format version
    #[error("unsupported bundle version: {0}")]
    UnsupportedVersion(u32),

    /// Input ended before the declared structure did
    #[error("truncated bundle: needed {needed} bytes at offset {offset}, payload has {available}")]
    Truncated {
        /// Bytes required by the structure being read
        needed: usize,
        /// Offset the read started at
        offset: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Path length at or beyond the maximum
    #[error("path length {0} exceeds maximum")]
    PathTooLong(usize),

    /// Path bytes were not valid UTF-8
    #[error("file path is not valid UTF-8")]
    PathNotUtf8,

    /// A single file exceeds what the size fields can describe
    #[error("file too large for bundle: {path} is {len} bytes")]
    OversizedFile {
        /// Path of the offending file entry
        path: String,
        /// Actual data length
        len: usize,
    },

    /// Declared file data does not fit in the payload
    #[error("file data overruns payload: {path} wants {len} bytes at offset {offset}")]
    DataOverrun {
        /// Path of the offending file entry
        path: String,
        /// Offset of the file's data within the payload
        offset: usize,
        /// Declared data length
        len: usize,
    },

    /// Decompressed payload size did not match the header
    #[error("payload size mismatch: header declares {declared} bytes, got {actual}")]
    SizeMismatch {
        /// Size declared in the header
        declared: u32,
        /// Size actually produced
        actual: usize,
    },

    /// A file's bytes did not match its embedded digest
    #[error("integrity check failed for {path}")]
    ChecksumMismatch {
        /// Path of the corrupted file entry
        path: String,
    },

    /// Compression/decompression error
    #[error("compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for bundle operations
pub type BundleResult<T> = Result<T, BundleError>;
