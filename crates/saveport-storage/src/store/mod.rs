//! Save sources behind one capability interface
//!
//! Four kinds of save source exist; [`SaveStore`] routes each title to
//! its adapter based on [`TitleSource`]. The engine talks only to the
//! [`SaveAccess`] capability so tests can substitute a fake store.

mod archive;
mod cartridge;
mod media;

pub use archive::ArchiveStore;
pub use cartridge::CartridgeStore;
pub use media::{HandheldStore, MediaStore};

use crate::error::{StorageError, StorageResult};
use crate::title::{Title, TitleSource};
use saveport_cart::SpiBus;
use saveport_formats::SaveFile;

/// File name used by the single-file save sources
///
/// Cartridge and external-handheld saves are always one entry with this
/// name.
pub const SINGLE_SAVE_NAME: &str = "save.dat";

/// The save capability every source provides
///
/// Reads of a missing save return an empty list, never an error. Writes
/// replace any existing save in its entirety. Saves are assumed stable
/// between a read and a later write within one sync pass; nothing else
/// mutates them while the engine runs.
pub trait SaveAccess {
    /// Read a title's save as an ordered file list
    fn read_save(&mut self, title: &Title) -> StorageResult<Vec<SaveFile>>;

    /// Replace a title's save with the given file list
    fn write_save(&mut self, title: &Title, files: &[SaveFile]) -> StorageResult<()>;

    /// Whether a save currently exists for the title
    fn has_save(&mut self, title: &Title) -> bool;
}

/// Router over the four save sources
///
/// The cartridge adapter is optional; hosts without a cartridge bus
/// still sync every other kind.
pub struct SaveStore<B: SpiBus> {
    archive: ArchiveStore,
    media: MediaStore,
    handheld: HandheldStore,
    cartridge: Option<CartridgeStore<B>>,
}

impl<B: SpiBus> SaveStore<B> {
    /// Create a store over the platform archive mount root
    pub fn new(archive: ArchiveStore) -> Self {
        Self {
            archive,
            media: MediaStore,
            handheld: HandheldStore,
            cartridge: None,
        }
    }

    /// Attach the cartridge adapter
    #[must_use]
    pub fn with_cartridge(mut self, cartridge: CartridgeStore<B>) -> Self {
        self.cartridge = Some(cartridge);
        self
    }

    fn cartridge_mut(&mut self) -> StorageResult<&mut CartridgeStore<B>> {
        self.cartridge.as_mut().ok_or(StorageError::NoCartridgeBus)
    }
}

impl<B: SpiBus> SaveAccess for SaveStore<B> {
    fn read_save(&mut self, title: &Title) -> StorageResult<Vec<SaveFile>> {
        match &title.source {
            TitleSource::Installed => self.archive.read_save(title.id),
            TitleSource::MediaFile { rom_path } => self.media.read_save(rom_path),
            TitleSource::HandheldFile { rom_path } => self.handheld.read_save(rom_path),
            TitleSource::Cartridge => self.cartridge_mut()?.read_save(),
        }
    }

    fn write_save(&mut self, title: &Title, files: &[SaveFile]) -> StorageResult<()> {
        match &title.source {
            TitleSource::Installed => self.archive.write_save(title.id, files),
            TitleSource::MediaFile { rom_path } => self.media.write_save(rom_path, files),
            TitleSource::HandheldFile { rom_path } => self.handheld.write_save(rom_path, files),
            TitleSource::Cartridge => self.cartridge_mut()?.write_save(files),
        }
    }

    fn has_save(&mut self, title: &Title) -> bool {
        match &title.source {
            TitleSource::Installed => self.archive.has_save(title.id),
            TitleSource::MediaFile { rom_path } => self.media.has_save(rom_path),
            TitleSource::HandheldFile { rom_path } => self.handheld.has_save(rom_path),
            TitleSource::Cartridge => self
                .cartridge
                .as_mut()
                .is_some_and(CartridgeStore::has_save),
        }
    }
}
