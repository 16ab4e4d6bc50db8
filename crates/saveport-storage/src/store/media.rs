//! Removable-media and external-handheld save adapters
//!
//! Both kinds map one ROM image to one sibling save file and present it
//! as a single-entry file list named [`SINGLE_SAVE_NAME`]. They differ
//! only in where the sibling is searched for.

use crate::error::{StorageError, StorageResult};
use crate::store::SINGLE_SAVE_NAME;
use saveport_formats::SaveFile;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Save file extension used next to ROM images
const SAVE_EXTENSION: &str = "sav";

/// Subdirectory searched by the handheld rules
const HANDHELD_SAVE_DIR: &str = "saves";

/// Loose ROM files on removable media
///
/// The save is the raw byte contents of `<rom_stem>.sav` next to the
/// ROM.
#[derive(Debug, Clone, Copy)]
pub struct MediaStore;

impl MediaStore {
    /// Read the sibling save as a single-entry list
    pub fn read_save(&self, rom_path: &Path) -> StorageResult<Vec<SaveFile>> {
        read_single(&sibling_save_path(rom_path))
    }

    /// Replace the sibling save
    pub fn write_save(&self, rom_path: &Path, files: &[SaveFile]) -> StorageResult<()> {
        write_single(&sibling_save_path(rom_path), files)
    }

    /// Whether the sibling save exists
    pub fn has_save(&self, rom_path: &Path) -> bool {
        sibling_save_path(rom_path).is_file()
    }
}

/// External-handheld ROM files
///
/// Searches `<rom_stem>.sav` beside the ROM first, then
/// `saves/<rom_stem>.sav` under the ROM's directory. New saves are
/// created at the sibling location.
#[derive(Debug, Clone, Copy)]
pub struct HandheldStore;

impl HandheldStore {
    fn locate(&self, rom_path: &Path) -> Option<PathBuf> {
        [sibling_save_path(rom_path), nested_save_path(rom_path)]
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    /// Read the save found by the search rules
    pub fn read_save(&self, rom_path: &Path) -> StorageResult<Vec<SaveFile>> {
        match self.locate(rom_path) {
            Some(path) => read_single(&path),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the save, preferring wherever it already exists
    pub fn write_save(&self, rom_path: &Path, files: &[SaveFile]) -> StorageResult<()> {
        let target = self
            .locate(rom_path)
            .unwrap_or_else(|| sibling_save_path(rom_path));
        write_single(&target, files)
    }

    /// Whether any of the search rules finds a save
    pub fn has_save(&self, rom_path: &Path) -> bool {
        self.locate(rom_path).is_some()
    }
}

fn sibling_save_path(rom_path: &Path) -> PathBuf {
    rom_path.with_extension(SAVE_EXTENSION)
}

fn nested_save_path(rom_path: &Path) -> PathBuf {
    let file = sibling_save_path(rom_path);
    match (rom_path.parent(), file.file_name()) {
        (Some(parent), Some(name)) => parent.join(HANDHELD_SAVE_DIR).join(name),
        _ => file,
    }
}

fn read_single(save_path: &Path) -> StorageResult<Vec<SaveFile>> {
    if !save_path.is_file() {
        return Ok(Vec::new());
    }
    Ok(vec![SaveFile::new(
        SINGLE_SAVE_NAME,
        fs::read(save_path)?,
    )])
}

fn write_single(save_path: &Path, files: &[SaveFile]) -> StorageResult<()> {
    match files {
        [] => {
            if save_path.is_file() {
                fs::remove_file(save_path)?;
            }
            Ok(())
        }
        [file] => {
            fs::write(save_path, &file.data)?;
            debug!("wrote {} bytes to {}", file.data.len(), save_path.display());
            Ok(())
        }
        _ => Err(StorageError::SingleFileKind { count: files.len() }),
    }
}
