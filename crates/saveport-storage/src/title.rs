//! The title model

use saveport_formats::TitleId;
use std::path::PathBuf;

/// Where a title's save data lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleSource {
    /// Installed on the device, saves in the platform save archive
    Installed,
    /// A ROM file on removable media with a sibling save file
    MediaFile {
        /// Path to the ROM image
        rom_path: PathBuf,
    },
    /// A physical cartridge in the slot
    Cartridge,
    /// An external-handheld ROM file with a sibling save file
    HandheldFile {
        /// Path to the ROM image
        rom_path: PathBuf,
    },
}

/// One syncable unit: a game's save data on one device
///
/// Titles are produced by enumeration and invalidated on rescan; the
/// engine never mutates one except for the transient [`in_conflict`]
/// marker.
///
/// [`in_conflict`]: Title::in_conflict
#[derive(Debug, Clone)]
pub struct Title {
    /// 64-bit identifier, 16 uppercase hex on the wire
    pub id: TitleId,
    /// Short product code, printable ASCII
    pub product_code: String,
    /// Human-readable name
    pub name: String,
    /// Where the save data lives
    pub source: TitleSource,
    /// Whether a local save currently exists
    pub has_save: bool,
    /// Whether the last sync reported a conflict for this title
    pub in_conflict: bool,
}

impl Title {
    /// Create a title with no name and no save yet
    pub fn new(id: TitleId, product_code: impl Into<String>, source: TitleSource) -> Self {
        Self {
            id,
            product_code: product_code.into(),
            name: String::new(),
            source,
            has_save: false,
            in_conflict: false,
        }
    }

    /// Set the human-readable name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether this title's save lives on a physical cartridge
    ///
    /// Cartridge titles are excluded from batch sync; they move only
    /// through explicit per-title operations.
    pub fn is_cartridge(&self) -> bool {
        matches!(self.source, TitleSource::Cartridge)
    }
}
