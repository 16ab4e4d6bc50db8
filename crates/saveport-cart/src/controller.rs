//! Cartridge save-chip controller

use crate::bus::SpiBus;
use crate::chip::{AddressMode, SaveChip};
use crate::error::{CartError, CartResult};
use tracing::{debug, trace, warn};

/// Read the status register
pub const CMD_READ_STATUS: u8 = 0x05;
/// Read memory starting at an address
pub const CMD_READ: u8 = 0x03;
/// Set the write-enable latch
pub const CMD_WRITE_ENABLE: u8 = 0x06;
/// Clear the write-enable latch
pub const CMD_WRITE_DISABLE: u8 = 0x04;
/// Program up to one page at an address
pub const CMD_PAGE_WRITE: u8 = 0x02;
/// Erase the 64 KiB sector containing an address
pub const CMD_SECTOR_ERASE: u8 = 0xD8;
/// Read the JEDEC manufacturer/device id
pub const CMD_JEDEC_ID: u8 = 0x9F;

/// Status bit: write in progress
pub const STATUS_WIP: u8 = 0x01;
/// Status bit: write-enable latch
pub const STATUS_WEL: u8 = 0x02;

/// Flash sector size for erase operations
pub const SECTOR_SIZE: usize = 64 * 1024;

/// Largest read carried by one bus transaction
const READ_CHUNK: usize = 256;

/// Deadline for byte and page writes
const WRITE_TIMEOUT_MS: u64 = 50;
/// Deadline for sector erase
const ERASE_TIMEOUT_MS: u64 = 3000;
/// Status poll interval
const POLL_INTERVAL_MS: u64 = 1;

/// JEDEC manufacturer ids of the known flash vendors
const FLASH_VENDORS: [u8; 5] = [0x20, 0xC2, 0x62, 0x1C, 0xBF];

/// Controller for the save chip on an inserted cartridge
///
/// Owns the bus for its lifetime; the cartridge bus has a single user,
/// so at most one controller should be live in a process.
pub struct CartController<B: SpiBus> {
    bus: B,
}

impl<B: SpiBus> CartController<B> {
    /// Take ownership of the bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Release the bus
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Identify the save chip on the inserted cartridge
    ///
    /// Probes in order: JEDEC id for flash parts, write-enable latch for
    /// presence, then address-wrap reads to separate the EEPROM and FRAM
    /// geometries. A chip whose first 32 bytes are uniform (a blank or
    /// freshly erased part) cannot be probed by content and defaults to
    /// the 64 KiB EEPROM class.
    pub fn detect(&mut self) -> CartResult<SaveChip> {
        let id = self.jedec_id()?;
        if FLASH_VENDORS.contains(&id[0]) {
            let chip = match id[2] {
                0x10 | 0x12 => SaveChip::Flash256K,
                0x13 => SaveChip::Flash512K,
                0x14 => SaveChip::Flash1M,
                0x17 => SaveChip::Flash8M,
                capacity => {
                    warn!(
                        "unrecognized flash capacity byte 0x{capacity:02X} from vendor 0x{:02X}",
                        id[0]
                    );
                    SaveChip::Flash256K
                }
            };
            debug!("detected {chip} via JEDEC id {id:02X?}");
            return Ok(chip);
        }

        // Presence probe: a live chip latches WEL
        self.write_enable()?;
        let status = self.read_status()?;
        self.write_disable()?;
        if status & STATUS_WEL == 0 {
            return Err(CartError::NoCartridge);
        }

        let mut reference = [0u8; 32];
        self.read_raw(AddressMode::TwoByte, 0, &mut reference)?;
        if reference.iter().all(|&b| b == reference[0]) {
            debug!("uniform content at offset 0, defaulting to {}", SaveChip::Eeprom64K);
            return Ok(SaveChip::Eeprom64K);
        }

        let mut probe = [0u8; 32];
        self.read_raw(AddressMode::TwoByte, 0x2000, &mut probe)?;
        if probe == reference {
            debug!("address wrap at 8 KiB");
            return Ok(SaveChip::Eeprom8K);
        }

        self.read_raw(AddressMode::TwoByte, 0x8000, &mut probe)?;
        if probe == reference {
            debug!("address wrap at 32 KiB");
            return Ok(SaveChip::Fram32K);
        }

        self.read_raw(AddressMode::TwoByteBanked, 0x10000, &mut probe)?;
        let chip = if probe == reference {
            SaveChip::Eeprom64K
        } else {
            SaveChip::Eeprom128K
        };
        debug!("detected {chip} via upper-bank probe");
        Ok(chip)
    }

    /// Read the chip's full contents
    pub fn read_full(&mut self, chip: SaveChip) -> CartResult<Vec<u8>> {
        let size = chip.capacity();
        if size == 0 {
            return Err(CartError::UnsupportedChip(chip));
        }
        let mode = chip.address_mode();
        let mut image = vec![0u8; size];
        for offset in (0..size).step_by(READ_CHUNK) {
            let end = (offset + READ_CHUNK).min(size);
            self.read_raw(mode, offset as u32, &mut image[offset..end])?;
        }
        trace!("read {size} bytes from {chip}");
        Ok(image)
    }

    /// Replace the chip's full contents
    ///
    /// A payload shorter than the chip is padded to capacity with 0xFF.
    /// Flash parts have their whole save range sector-erased before any
    /// page is programmed.
    pub fn write_full(&mut self, chip: SaveChip, data: &[u8]) -> CartResult<()> {
        let size = chip.capacity();
        if size == 0 {
            return Err(CartError::UnsupportedChip(chip));
        }
        if data.len() > size {
            return Err(CartError::BufferTooLarge {
                len: data.len(),
                capacity: size,
            });
        }

        let mut image = vec![0xFFu8; size];
        image[..data.len()].copy_from_slice(data);

        if chip.requires_erase() {
            for sector in (0..size).step_by(SECTOR_SIZE) {
                self.sector_erase(sector as u32)?;
            }
        }

        let page = chip.page_size();
        for offset in (0..size).step_by(page) {
            let end = (offset + page).min(size);
            self.page_write(chip, offset as u32, &image[offset..end])?;
        }
        debug!("wrote {} payload bytes to {chip}, padded to {size}", data.len());
        Ok(())
    }

    /// Read the status register
    pub fn read_status(&mut self) -> CartResult<u8> {
        let mut status = [0u8; 1];
        self.bus.exchange(&[CMD_READ_STATUS], &mut status)?;
        Ok(status[0])
    }

    fn jedec_id(&mut self) -> CartResult<[u8; 3]> {
        let mut id = [0u8; 3];
        self.bus.exchange(&[CMD_JEDEC_ID], &mut id)?;
        Ok(id)
    }

    fn write_enable(&mut self) -> CartResult<()> {
        self.bus.exchange(&[CMD_WRITE_ENABLE], &mut [])
    }

    fn write_disable(&mut self) -> CartResult<()> {
        self.bus.exchange(&[CMD_WRITE_DISABLE], &mut [])
    }

    fn read_raw(&mut self, mode: AddressMode, addr: u32, out: &mut [u8]) -> CartResult<()> {
        let (frame, len) = encode_command(CMD_READ, mode, addr);
        self.bus.exchange(&frame[..len], out)
    }

    fn page_write(&mut self, chip: SaveChip, addr: u32, data: &[u8]) -> CartResult<()> {
        self.write_enable()?;
        let (frame, len) = encode_command(CMD_PAGE_WRITE, chip.address_mode(), addr);
        let mut command = Vec::with_capacity(len + data.len());
        command.extend_from_slice(&frame[..len]);
        command.extend_from_slice(data);
        self.bus.exchange(&command, &mut [])?;
        self.wait_while_busy(WRITE_TIMEOUT_MS, "page write")
    }

    fn sector_erase(&mut self, addr: u32) -> CartResult<()> {
        self.write_enable()?;
        let (frame, len) = encode_command(CMD_SECTOR_ERASE, AddressMode::ThreeByte, addr);
        self.bus.exchange(&frame[..len], &mut [])?;
        self.wait_while_busy(ERASE_TIMEOUT_MS, "sector erase")
    }

    /// Poll the status register until WIP clears or the deadline passes
    fn wait_while_busy(&mut self, timeout_ms: u64, op: &'static str) -> CartResult<()> {
        let mut waited = 0;
        loop {
            if self.read_status()? & STATUS_WIP == 0 {
                return Ok(());
            }
            if waited >= timeout_ms {
                return Err(CartError::Timeout { op, ms: timeout_ms });
            }
            self.bus.delay_ms(POLL_INTERVAL_MS);
            waited += POLL_INTERVAL_MS;
        }
    }
}

/// Build a command frame for an opcode and address
///
/// Returns the frame buffer and the number of valid bytes in it. The
/// banked modes fold the address's top bit into command bit 3.
fn encode_command(opcode: u8, mode: AddressMode, addr: u32) -> ([u8; 4], usize) {
    match mode {
        AddressMode::OneByte => {
            let banked = opcode | (((addr >> 8) & 1) as u8) << 3;
            ([banked, addr as u8, 0, 0], 2)
        }
        AddressMode::TwoByte => ([opcode, (addr >> 8) as u8, addr as u8, 0], 3),
        AddressMode::TwoByteBanked => {
            let banked = opcode | (((addr >> 16) & 1) as u8) << 3;
            ([banked, (addr >> 8) as u8, addr as u8, 0], 3)
        }
        AddressMode::ThreeByte => (
            [opcode, (addr >> 16) as u8, (addr >> 8) as u8, addr as u8],
            4,
        ),
    }
}
