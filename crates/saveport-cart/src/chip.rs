//! Save chip catalogue

use std::fmt;

/// How a chip's address bytes are laid out in a command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// One address byte, address bit 8 folded into command bit 3
    OneByte,
    /// Two address bytes, high byte first
    TwoByte,
    /// Two address bytes, address bit 16 folded into command bit 3
    TwoByteBanked,
    /// Three address bytes, high byte first
    ThreeByte,
}

/// Save memory chip found on a cartridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChip {
    /// Detection failed to classify the chip
    Unknown,
    /// 512 B EEPROM
    Eeprom512B,
    /// 8 KiB EEPROM
    Eeprom8K,
    /// 64 KiB EEPROM
    Eeprom64K,
    /// 128 KiB EEPROM
    Eeprom128K,
    /// 256 KiB NOR flash
    Flash256K,
    /// 512 KiB NOR flash
    Flash512K,
    /// 1 MiB NOR flash
    Flash1M,
    /// 8 MiB NOR flash
    Flash8M,
    /// 32 KiB FRAM
    Fram32K,
}

impl SaveChip {
    /// Total chip size in bytes (0 for [`SaveChip::Unknown`])
    pub fn capacity(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Eeprom512B => 512,
            Self::Eeprom8K => 8 * 1024,
            Self::Eeprom64K => 64 * 1024,
            Self::Eeprom128K => 128 * 1024,
            Self::Flash256K => 256 * 1024,
            Self::Flash512K => 512 * 1024,
            Self::Flash1M => 1024 * 1024,
            Self::Flash8M => 8 * 1024 * 1024,
            Self::Fram32K => 32 * 1024,
        }
    }

    /// Largest write that one program command may carry
    ///
    /// FRAM has no page structure; the whole part is writable in one
    /// command.
    pub fn page_size(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Eeprom512B => 16,
            Self::Eeprom8K => 32,
            Self::Eeprom64K | Self::Eeprom128K => 128,
            Self::Flash256K | Self::Flash512K | Self::Flash1M | Self::Flash8M => 256,
            Self::Fram32K => 32 * 1024,
        }
    }

    /// Address layout for read and program commands
    pub fn address_mode(self) -> AddressMode {
        match self {
            Self::Unknown | Self::Eeprom512B => AddressMode::OneByte,
            Self::Eeprom8K | Self::Eeprom64K | Self::Fram32K => AddressMode::TwoByte,
            Self::Eeprom128K => AddressMode::TwoByteBanked,
            Self::Flash256K | Self::Flash512K | Self::Flash1M | Self::Flash8M => {
                AddressMode::ThreeByte
            }
        }
    }

    /// Whether writes must be preceded by a sector erase
    pub fn requires_erase(self) -> bool {
        matches!(
            self,
            Self::Flash256K | Self::Flash512K | Self::Flash1M | Self::Flash8M
        )
    }
}

impl fmt::Display for SaveChip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Eeprom512B => "EEPROM 512 B",
            Self::Eeprom8K => "EEPROM 8 KiB",
            Self::Eeprom64K => "EEPROM 64 KiB",
            Self::Eeprom128K => "EEPROM 128 KiB",
            Self::Flash256K => "FLASH 256 KiB",
            Self::Flash512K => "FLASH 512 KiB",
            Self::Flash1M => "FLASH 1 MiB",
            Self::Flash8M => "FLASH 8 MiB",
            Self::Fram32K => "FRAM 32 KiB",
        };
        f.write_str(name)
    }
}
