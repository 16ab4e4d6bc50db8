//! Title enumeration and naming glue
//!
//! Installed titles are enumerated by the platform layer and handed to
//! the engine; what this module contributes is the host-side pieces:
//! scanning a directory of external-handheld ROM images into titles,
//! and resolving product codes to display names through the server.

use crate::error::SyncResult;
use crate::transport::Transport;
use saveport_formats::TitleId;
use saveport_storage::store::HandheldStore;
use saveport_storage::{StorageError, Title, TitleSource};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// ROM extension recognized by the handheld scan
const HANDHELD_ROM_EXTENSION: &str = "gba";

/// Header offset of the four-byte game code
const GAME_CODE_OFFSET: u64 = 0x0C;

/// Product-code prefix for handheld titles
const HANDHELD_CODE_PREFIX: &str = "AGB";

/// Scan a directory of handheld ROM images into titles
///
/// Unreadable images and images without a printable game code are
/// reported and skipped, never fatal. Results are ordered by title id
/// so repeated scans enumerate identically.
pub fn scan_handheld_roms(dir: &Path) -> SyncResult<Vec<Title>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut titles = Vec::new();
    for entry in fs::read_dir(dir).map_err(StorageError::from)? {
        let path = entry.map_err(StorageError::from)?.path();
        let is_rom = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(HANDHELD_ROM_EXTENSION));
        if !is_rom {
            continue;
        }
        match handheld_title(&path) {
            Ok(title) => titles.push(title),
            Err(err) => warn!("skipping {}: {err}", path.display()),
        }
    }

    titles.sort_by_key(|title| title.id);
    debug!("enumerated {} handheld titles", titles.len());
    Ok(titles)
}

/// Build a title from one ROM image
fn handheld_title(rom_path: &Path) -> Result<Title, StorageError> {
    let mut rom = File::open(rom_path)?;
    rom.seek(SeekFrom::Start(GAME_CODE_OFFSET))?;
    let mut code = [0u8; 4];
    rom.read_exact(&mut code)
        .map_err(|_| StorageError::BadRom(rom_path.to_path_buf()))?;

    let id = TitleId::from_handheld_game_code(code)
        .map_err(|_| StorageError::BadRom(rom_path.to_path_buf()))?;
    // Game-code bytes were validated as printable ASCII above
    let code_str: String = code.iter().map(|&b| b as char).collect();

    let name = rom_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();

    let mut title = Title::new(
        id,
        format!("{HANDHELD_CODE_PREFIX}-{code_str}"),
        TitleSource::HandheldFile {
            rom_path: rom_path.to_path_buf(),
        },
    )
    .with_name(name);
    title.has_save = HandheldStore.has_save(rom_path);
    Ok(title)
}

/// Resolve missing display names through the server
///
/// Returns how many titles were named. Titles that already carry a
/// name, or whose code the server does not know, are left as they are.
pub async fn apply_names(transport: &Transport, titles: &mut [Title]) -> SyncResult<usize> {
    let codes: Vec<String> = titles
        .iter()
        .filter(|title| !title.product_code.is_empty())
        .map(|title| title.product_code.clone())
        .collect();
    if codes.is_empty() {
        return Ok(0);
    }

    let names = transport.lookup_names(&codes).await?;
    let mut applied = 0;
    for title in titles.iter_mut() {
        if let Some(name) = names.get(&title.product_code) {
            title.name = name.clone();
            applied += 1;
        }
    }
    Ok(applied)
}
