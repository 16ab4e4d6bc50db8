//! Host-side emulation of cartridge save chips
//!
//! [`EmulatedChip`] implements [`SpiBus`] over an in-memory image with
//! the command set, address wrapping, write-enable latch, and busy
//! signalling of the real parts. It exists so detection and transfer
//! logic can be exercised without hardware; it is strict about protocol
//! misuse (programming without the write-enable latch is an error, not
//! a silent no-op).

use crate::bus::SpiBus;
use crate::chip::{AddressMode, SaveChip};
use crate::controller::{
    CMD_JEDEC_ID, CMD_PAGE_WRITE, CMD_READ, CMD_READ_STATUS, CMD_SECTOR_ERASE, CMD_WRITE_DISABLE,
    CMD_WRITE_ENABLE, SECTOR_SIZE, STATUS_WEL, STATUS_WIP,
};
use crate::error::{CartError, CartResult};

/// Number of status polls a program or erase stays busy for
const BUSY_POLLS: u32 = 2;

/// One bus operation observed by the emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Memory read at an address
    Read {
        /// Decoded start address
        addr: u32,
        /// Bytes clocked back
        len: usize,
    },
    /// Page program at an address
    Program {
        /// Decoded start address
        addr: u32,
        /// Data bytes carried
        len: usize,
    },
    /// Sector erase covering an address
    Erase {
        /// Decoded sector address
        addr: u32,
    },
}

/// An in-memory cartridge save chip
pub struct EmulatedChip {
    memory: Vec<u8>,
    mode: AddressMode,
    jedec: [u8; 3],
    flash: bool,
    present: bool,
    wel: bool,
    busy_polls: u32,
    stuck_busy: bool,
    ops: Vec<Operation>,
    waited_ms: u64,
}

impl EmulatedChip {
    /// Emulate an EEPROM or FRAM part of the given geometry
    pub fn eeprom(chip: SaveChip) -> Self {
        Self {
            memory: vec![0xFF; chip.capacity()],
            mode: chip.address_mode(),
            jedec: [0; 3],
            flash: false,
            present: true,
            wel: false,
            busy_polls: 0,
            stuck_busy: false,
            ops: Vec::new(),
            waited_ms: 0,
        }
    }

    /// Emulate a NOR flash part answering the given JEDEC id
    pub fn flash(chip: SaveChip, jedec: [u8; 3]) -> Self {
        Self {
            memory: vec![0xFF; chip.capacity()],
            mode: chip.address_mode(),
            jedec,
            flash: true,
            ..Self::eeprom(SaveChip::Unknown)
        }
    }

    /// Emulate an empty cartridge slot
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::eeprom(SaveChip::Eeprom64K)
        }
    }

    /// Fill memory with a pattern that never repeats at the detection
    /// probe offsets (period 251, coprime to the power-of-two wraps)
    #[must_use]
    pub fn with_probe_pattern(mut self) -> Self {
        for (i, byte) in self.memory.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        self
    }

    /// Replace the start of memory with specific content
    #[must_use]
    pub fn with_content(mut self, data: &[u8]) -> Self {
        self.memory[..data.len()].copy_from_slice(data);
        self
    }

    /// Keep the busy bit set forever after the next program or erase
    #[must_use]
    pub fn with_stuck_busy(mut self) -> Self {
        self.stuck_busy = true;
        self
    }

    /// Current memory image
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Operations observed, in order
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Total milliseconds of delay requested by the controller
    pub fn waited_ms(&self) -> u64 {
        self.waited_ms
    }

    /// Wrap an address onto the physical array, as the real parts do by
    /// ignoring address bits above their capacity
    fn wrap(&self, addr: u32) -> usize {
        (addr as usize) & (self.memory.len() - 1)
    }

    fn decode_addressed(&self, command: &[u8]) -> CartResult<(u8, u32, usize)> {
        let opcode = command[0] & 0xF7;
        let bank = u32::from((command[0] >> 3) & 1);
        let header = match self.mode {
            AddressMode::OneByte => 2,
            AddressMode::TwoByte | AddressMode::TwoByteBanked => 3,
            AddressMode::ThreeByte => 4,
        };
        if command.len() < header {
            return Err(CartError::Bus(format!(
                "command 0x{opcode:02X} shorter than its address"
            )));
        }
        let addr = match self.mode {
            AddressMode::OneByte => (bank << 8) | u32::from(command[1]),
            // Parts of this class ignore the bank bit entirely
            AddressMode::TwoByte => (u32::from(command[1]) << 8) | u32::from(command[2]),
            AddressMode::TwoByteBanked => {
                (bank << 16) | (u32::from(command[1]) << 8) | u32::from(command[2])
            }
            AddressMode::ThreeByte => {
                (u32::from(command[1]) << 16) | (u32::from(command[2]) << 8) | u32::from(command[3])
            }
        };
        Ok((opcode, addr, header))
    }

    fn status_byte(&mut self) -> u8 {
        let mut status = 0;
        if self.wel {
            status |= STATUS_WEL;
        }
        if self.busy_polls > 0 {
            status |= STATUS_WIP;
            if !self.stuck_busy {
                self.busy_polls -= 1;
            }
        }
        status
    }

    fn begin_busy(&mut self) {
        self.busy_polls = if self.stuck_busy { u32::MAX } else { BUSY_POLLS };
        self.wel = false;
    }
}

impl SpiBus for EmulatedChip {
    fn exchange(&mut self, command: &[u8], response: &mut [u8]) -> CartResult<()> {
        if command.is_empty() {
            return Err(CartError::Bus("empty command frame".into()));
        }

        if !self.present {
            // Floating bus: nothing drives MISO
            response.fill(0xFF);
            if command[0] == CMD_READ_STATUS {
                response.fill(0x00);
            }
            return Ok(());
        }

        match command[0] {
            CMD_READ_STATUS => {
                let status = self.status_byte();
                response.fill(status);
                return Ok(());
            }
            CMD_WRITE_ENABLE => {
                self.wel = true;
                return Ok(());
            }
            CMD_WRITE_DISABLE => {
                self.wel = false;
                return Ok(());
            }
            CMD_JEDEC_ID => {
                let id = if self.flash { self.jedec } else { [0; 3] };
                for (out, byte) in response.iter_mut().zip(id) {
                    *out = byte;
                }
                return Ok(());
            }
            CMD_SECTOR_ERASE => {
                if !self.flash {
                    return Err(CartError::Bus("sector erase on a non-flash part".into()));
                }
                if !self.wel {
                    return Err(CartError::Bus("sector erase without write enable".into()));
                }
                if command.len() < 4 {
                    return Err(CartError::Bus("sector erase frame too short".into()));
                }
                let addr = (u32::from(command[1]) << 16)
                    | (u32::from(command[2]) << 8)
                    | u32::from(command[3]);
                let start = self.wrap(addr) & !(SECTOR_SIZE - 1);
                let end = (start + SECTOR_SIZE).min(self.memory.len());
                self.memory[start..end].fill(0xFF);
                self.ops.push(Operation::Erase { addr });
                self.begin_busy();
                return Ok(());
            }
            _ => {}
        }

        let (opcode, addr, header) = self.decode_addressed(command)?;
        match opcode {
            CMD_READ => {
                for (i, out) in response.iter_mut().enumerate() {
                    let index = self.wrap(addr + i as u32);
                    *out = self.memory[index];
                }
                self.ops.push(Operation::Read {
                    addr,
                    len: response.len(),
                });
                Ok(())
            }
            CMD_PAGE_WRITE => {
                if !self.wel {
                    return Err(CartError::Bus("page program without write enable".into()));
                }
                let data = &command[header..];
                for (i, &byte) in data.iter().enumerate() {
                    let index = self.wrap(addr + i as u32);
                    if self.flash {
                        // NOR programming can only clear bits
                        self.memory[index] &= byte;
                    } else {
                        self.memory[index] = byte;
                    }
                }
                self.ops.push(Operation::Program {
                    addr,
                    len: data.len(),
                });
                self.begin_busy();
                Ok(())
            }
            other => Err(CartError::Bus(format!("unknown opcode 0x{other:02X}"))),
        }
    }

    fn delay_ms(&mut self, ms: u64) {
        self.waited_ms += ms;
    }
}
