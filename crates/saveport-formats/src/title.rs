//! Title identifiers and their wire encodings

use std::fmt;
use thiserror::Error;

/// High word of synthesized external-handheld title ids
pub const HANDHELD_TITLE_HIGH: u32 = 0x0004_8000;

/// Title identifier errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TitleIdError {
    /// Hex form must be exactly 16 characters
    #[error("invalid title id length: expected 16 hex characters, got {0}")]
    InvalidLength(usize),

    /// Hex form contained a non-hex character
    #[error("invalid title id hex: {0:?}")]
    InvalidHex(String),

    /// Handheld game codes must be printable ASCII
    #[error("game code byte 0x{0:02X} is not printable ASCII")]
    NonPrintableGameCode(u8),
}

/// 64-bit title identifier
///
/// Rendered as 16 uppercase hex characters on the wire and in journal
/// file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleId(u64);

impl TitleId {
    /// Create a title id from its native 64-bit value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parse from the 16-uppercase-hex wire form
    ///
    /// Lowercase hex digits are accepted on input; rendering always
    /// produces uppercase.
    pub fn from_hex(hex: &str) -> Result<Self, TitleIdError> {
        if hex.len() != 16 {
            return Err(TitleIdError::InvalidLength(hex.len()));
        }
        // from_str_radix would also take a sign character
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TitleIdError::InvalidHex(hex.to_string()));
        }
        u64::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| TitleIdError::InvalidHex(hex.to_string()))
    }

    /// Synthesize the title id for an external-handheld ROM
    ///
    /// The four bytes are the game code read from header offset 0x0C of
    /// the ROM image and must be printable ASCII in `[0x20, 0x7E]`.
    pub fn from_handheld_game_code(code: [u8; 4]) -> Result<Self, TitleIdError> {
        for byte in code {
            if !(0x20..=0x7E).contains(&byte) {
                return Err(TitleIdError::NonPrintableGameCode(byte));
            }
        }
        let low = (u64::from(code[0]) << 24)
            | (u64::from(code[1]) << 16)
            | (u64::from(code[2]) << 8)
            | u64::from(code[3]);
        Ok(Self((u64::from(HANDHELD_TITLE_HIGH) << 32) | low))
    }

    /// Render as 16 uppercase hex characters
    pub fn to_hex(self) -> String {
        format!("{:016X}", self.0)
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl From<u64> for TitleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<TitleId> for u64 {
    fn from(id: TitleId) -> Self {
        id.0
    }
}
