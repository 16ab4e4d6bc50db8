//! Cartridge access error types

use crate::chip::SaveChip;
use thiserror::Error;

/// Cartridge-specific error type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// No cartridge responded on the bus
    #[error("no cartridge present")]
    NoCartridge,

    /// A write or erase did not complete within its deadline
    #[error("{op} timed out after {ms} ms")]
    Timeout {
        /// Operation that was waiting on the chip
        op: &'static str,
        /// Deadline that elapsed
        ms: u64,
    },

    /// The chip type has no usable geometry
    #[error("unsupported chip: {0}")]
    UnsupportedChip(SaveChip),

    /// Payload larger than the chip
    #[error("payload of {len} bytes exceeds chip capacity of {capacity}")]
    BufferTooLarge {
        /// Payload length
        len: usize,
        /// Chip capacity
        capacity: usize,
    },

    /// The underlying bus transaction failed
    #[error("bus error: {0}")]
    Bus(String),
}

/// Result type for cartridge operations
pub type CartResult<T> = Result<T, CartError>;
