//! Cartridge save-chip access over a serial command bus
//!
//! Game cartridges back their save data with a small serial memory chip:
//! an EEPROM, a NOR flash, or an FRAM, each with its own capacity,
//! addressing width, page size, and erase requirements. This crate
//! drives that chip through a byte-oriented command bus:
//!
//! - [`SpiBus`] is the hardware seam: one command/response exchange per
//!   chip-select frame, plus the millisecond delay used between status
//!   polls. Tests and host-side development use [`emulated::EmulatedChip`].
//! - [`CartController`] owns a bus and implements detection, chunked
//!   full-image reads, and erase-then-program full-image writes. One
//!   controller is live at a time; the cartridge bus has no concurrent
//!   users.
//! - [`SaveChip`] is the catalogue of supported chip geometries.

#![warn(missing_docs)]

mod bus;
mod chip;
mod controller;
mod error;

pub mod emulated;

pub use bus::SpiBus;
pub use chip::{AddressMode, SaveChip};
pub use controller::{
    CMD_JEDEC_ID, CMD_PAGE_WRITE, CMD_READ, CMD_READ_STATUS, CMD_SECTOR_ERASE, CMD_WRITE_DISABLE,
    CMD_WRITE_ENABLE, CartController, SECTOR_SIZE, STATUS_WEL, STATUS_WIP,
};
pub use error::{CartError, CartResult};
