//! Engine error types

use reqwest::StatusCode;
use saveport_formats::bundle::BundleError;
use saveport_storage::StorageError;
use thiserror::Error;

/// Sync-engine error type
///
/// Errors are per-title: a batch never aborts because one title failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport failed before a response was obtained
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response arrived with a status other than 200
    #[error("server returned {0}")]
    Server(StatusCode),

    /// Save store read or write failed
    #[error(transparent)]
    Archive(#[from] StorageError),

    /// Bundle encode or decode violated a format invariant
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// Encoded bundle exceeded the upload limit
    #[error("bundle of {size} bytes exceeds upload limit of {limit}")]
    TooLarge {
        /// Encoded bundle size
        size: usize,
        /// Configured limit
        limit: u64,
    },
}

impl SyncError {
    /// Short user-visible description of the failure class
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network error",
            Self::Server(_) => "Server error",
            Self::Archive(_) => "Save read/write error",
            Self::Bundle(_) => "Bundle format error",
            Self::TooLarge { .. } => "Save too large",
        }
    }
}

/// Result type for engine operations
pub type SyncResult<T> = Result<T, SyncError>;
