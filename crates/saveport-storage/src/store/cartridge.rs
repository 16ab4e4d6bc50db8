//! Physical-cartridge save adapter

use crate::error::{StorageError, StorageResult};
use crate::store::SINGLE_SAVE_NAME;
use saveport_cart::{CartController, SpiBus};
use saveport_formats::SaveFile;
use tracing::debug;

/// Adapter over the cartridge save chip
///
/// Presents the full chip image as a single `save.dat` entry. The chip
/// is re-detected for every operation: cartridge swaps between calls
/// are undetectable, so stale geometry must never be reused. A removal
/// mid-operation simply fails the transfer.
pub struct CartridgeStore<B: SpiBus> {
    controller: CartController<B>,
}

impl<B: SpiBus> CartridgeStore<B> {
    /// Wrap a cartridge controller
    pub fn new(controller: CartController<B>) -> Self {
        Self { controller }
    }

    /// Read the full chip image as a single-entry list
    pub fn read_save(&mut self) -> StorageResult<Vec<SaveFile>> {
        let chip = self.controller.detect()?;
        let image = self.controller.read_full(chip)?;
        debug!("read {} byte image from {chip}", image.len());
        Ok(vec![SaveFile::new(SINGLE_SAVE_NAME, image)])
    }

    /// Replace the chip contents
    ///
    /// A payload shorter than the chip is padded with 0xFF by the
    /// controller.
    pub fn write_save(&mut self, files: &[SaveFile]) -> StorageResult<()> {
        let data: &[u8] = match files {
            [] => &[],
            [file] => &file.data,
            _ => return Err(StorageError::SingleFileKind { count: files.len() }),
        };
        let chip = self.controller.detect()?;
        self.controller.write_full(chip, data)?;
        Ok(())
    }

    /// Whether a cartridge with a save chip is present
    pub fn has_save(&mut self) -> bool {
        self.controller.detect().is_ok()
    }
}
