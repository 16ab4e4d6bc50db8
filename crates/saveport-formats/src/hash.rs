//! SHA-256 content addressing for save data

use crate::file_list::SaveFile;
use sha2::{Digest, Sha256};
use std::fmt;

/// Placeholder hash reported for a title with no local save
///
/// The sync protocol substitutes this literal instead of the hash of an
/// empty byte sequence, so the server can distinguish "no save" from "a
/// save that happens to be empty."
pub const ZERO_HASH_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Content hash (SHA-256) used to identify save data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a content hash from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a content hash from data by computing SHA-256
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }

    /// Hash an ordered save file list
    ///
    /// The digest covers the concatenation of every file's raw bytes in
    /// list order. Paths are not mixed in, so renames alone do not change
    /// the hash but reordering does.
    pub fn of_file_list(files: &[SaveFile]) -> Self {
        let mut hasher = ContentHasher::new();
        for file in files {
            hasher.update(&file.data);
        }
        hasher.finish()
    }

    /// Parse a content hash from a 64-character hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Streaming SHA-256 context for hashing data that arrives in pieces
///
/// Used when the bytes to hash are borrowed from a decode buffer and
/// collecting them into one slice first would copy the whole save.
pub struct ContentHasher(Sha256);

impl ContentHasher {
    /// Create a fresh hashing context
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    /// Feed more data into the context
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finalize the context into a content hash
    pub fn finish(self) -> ContentHash {
        let result = self.0.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        ContentHash::from_bytes(bytes)
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
