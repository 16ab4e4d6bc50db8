//! The last-synced state journal

use crate::error::{StorageError, StorageResult};
use saveport_formats::TitleId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// On-disk map from title id to the last server-reconciled content hash
///
/// One file per title, `<TITLE_ID_HEX>.txt`, holding exactly 64 hex
/// characters. Absence of the file means the title has never completed
/// a sync on this client. Entries are written at the end of a
/// successful upload or download and never read during one.
#[derive(Debug, Clone)]
pub struct StateJournal {
    dir: PathBuf,
}

impl StateJournal {
    /// Create a journal rooted at the given state directory
    ///
    /// The directory is created lazily on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the journal entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the last-synced hash for a title
    ///
    /// Returns `None` for a missing entry and for any entry that is not
    /// exactly 64 hex characters; a malformed entry is reported but
    /// treated as no history. The returned hex is normalized to
    /// lowercase.
    pub fn load(&self, title_id: TitleId) -> Option<String> {
        let path = self.entry_path(title_id);
        let text = fs::read_to_string(&path).ok()?;
        if !is_hash_hex(&text) {
            warn!("ignoring malformed journal entry at {}", path.display());
            return None;
        }
        Some(text.to_ascii_lowercase())
    }

    /// Store the last-synced hash for a title
    ///
    /// The value must be 64 hex characters; it is normalized to
    /// lowercase on disk. The entry is replaced atomically from the
    /// reader's point of view by a create-truncate-write-close.
    pub fn store(&self, title_id: TitleId, hash_hex: &str) -> StorageResult<()> {
        if !is_hash_hex(hash_hex) {
            return Err(StorageError::MalformedJournalValue(hash_hex.to_string()));
        }
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(title_id), hash_hex.to_ascii_lowercase())?;
        Ok(())
    }

    fn entry_path(&self, title_id: TitleId) -> PathBuf {
        self.dir.join(format!("{}.txt", title_id.to_hex()))
    }
}

fn is_hash_hex(text: &str) -> bool {
    text.len() == 64 && text.bytes().all(|b| b.is_ascii_hexdigit())
}
