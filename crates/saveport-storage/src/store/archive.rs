//! Platform save-archive adapter

use crate::error::{StorageError, StorageResult};
use saveport_formats::{SaveFile, TitleId};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Adapter over the device's mounted save archives
///
/// Each title's archive appears as a directory named after the title id
/// under the mount root. Reads walk the archive depth-first with
/// name-sorted listings so the file order, and therefore the content
/// hash, is deterministic. Writes replace the whole archive and finish
/// with a commit that flushes file data and directory metadata; a write
/// without the commit can be lost wholesale on power cut.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    mount_root: PathBuf,
}

impl ArchiveStore {
    /// Create an adapter over the given mount root
    pub fn new(mount_root: impl Into<PathBuf>) -> Self {
        Self {
            mount_root: mount_root.into(),
        }
    }

    fn title_root(&self, title_id: TitleId) -> PathBuf {
        self.mount_root.join(title_id.to_hex())
    }

    /// Read the full archive as an ordered file list
    pub fn read_save(&self, title_id: TitleId) -> StorageResult<Vec<SaveFile>> {
        let root = self.title_root(title_id);
        if !root.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        collect_files(&root, &root, &mut files)?;
        Ok(files)
    }

    /// Replace the archive's contents and commit
    pub fn write_save(&self, title_id: TitleId, files: &[SaveFile]) -> StorageResult<()> {
        let root = self.title_root(title_id);

        // Remove every prior file before writing the new set
        if root.is_dir() {
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let target = resolve_entry_path(&root, &file.path)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &file.data)?;
            written.push(target);
        }

        self.commit(&root, &written)?;
        debug!("wrote {} files to archive {}", files.len(), title_id);
        Ok(())
    }

    /// Whether the archive exists and holds at least one file
    pub fn has_save(&self, title_id: TitleId) -> bool {
        let root = self.title_root(title_id);
        root.is_dir() && dir_has_files(&root)
    }

    /// Flush file data and archive metadata to stable storage
    fn commit(&self, root: &Path, written: &[PathBuf]) -> StorageResult<()> {
        for path in written {
            File::open(path)?.sync_all()?;
        }
        // Directory metadata flush is best-effort where the platform
        // does not support syncing directory handles
        match File::open(root).and_then(|dir| dir.sync_all()) {
            Ok(()) => {}
            Err(err) => warn!("archive metadata flush skipped: {err}"),
        }
        Ok(())
    }
}

/// Resolve a save-relative path against the archive root, rejecting
/// anything that could escape it
fn resolve_entry_path(root: &Path, rel: &str) -> StorageResult<PathBuf> {
    if rel.is_empty() || rel.starts_with('/') || rel.starts_with('\\') {
        return Err(StorageError::InvalidPath(rel.to_string()));
    }
    let mut resolved = root.to_path_buf();
    for part in rel.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return Err(StorageError::InvalidPath(rel.to_string()));
        }
        resolved.push(part);
    }
    Ok(resolved)
}

/// Whether any file exists anywhere under `dir`
fn dir_has_files(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {
                if dir_has_files(&entry.path()) {
                    return true;
                }
            }
            Ok(_) => return true,
            Err(_) => {}
        }
    }
    false
}

/// Depth-first, name-sorted walk collecting files relative to `root`
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<SaveFile>) -> StorageResult<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .map_err(|_| StorageError::InvalidPath(path.display().to_string()))?;
            let rel = rel
                .to_str()
                .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?
                .replace('\\', "/");
            out.push(SaveFile::new(rel, fs::read(&path)?));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_id() -> TitleId {
        TitleId::new(0x0004_0000_0011_2233)
    }

    #[test]
    fn test_missing_archive_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArchiveStore::new(dir.path());
        assert_eq!(store.read_save(sample_id()).expect("read"), Vec::new());
        assert!(!store.has_save(sample_id()));
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArchiveStore::new(dir.path());

        let files = vec![
            SaveFile::new("main", vec![1, 2, 3]),
            SaveFile::new("sub/extra", vec![4, 5]),
        ];
        store.write_save(sample_id(), &files).expect("write");

        let read = store.read_save(sample_id()).expect("read");
        assert_eq!(read, files);
        assert!(store.has_save(sample_id()));
    }

    #[test]
    fn test_read_order_is_sorted_depth_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join(sample_id().to_hex());
        fs::create_dir_all(root.join("b")).expect("mkdir");
        fs::write(root.join("z"), [1]).expect("seed");
        fs::write(root.join("a"), [2]).expect("seed");
        fs::write(root.join("b").join("inner"), [3]).expect("seed");

        let store = ArchiveStore::new(dir.path());
        let read = store.read_save(sample_id()).expect("read");
        let paths: Vec<&str> = read.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["a", "b/inner", "z"]);
    }

    #[test]
    fn test_write_replaces_prior_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArchiveStore::new(dir.path());

        store
            .write_save(sample_id(), &[SaveFile::new("old", vec![9])])
            .expect("first write");
        store
            .write_save(sample_id(), &[SaveFile::new("new", vec![7])])
            .expect("second write");

        let read = store.read_save(sample_id()).expect("read");
        assert_eq!(read, vec![SaveFile::new("new", vec![7])]);
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArchiveStore::new(dir.path());

        for bad in ["/abs", "../escape", "a/../../b", ""] {
            let result = store.write_save(sample_id(), &[SaveFile::new(bad, vec![1])]);
            assert!(
                matches!(result, Err(StorageError::InvalidPath(_))),
                "{bad:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_empty_write_leaves_empty_archive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArchiveStore::new(dir.path());

        store
            .write_save(sample_id(), &[SaveFile::new("old", vec![9])])
            .expect("seed");
        store.write_save(sample_id(), &[]).expect("clear");

        assert_eq!(store.read_save(sample_id()).expect("read"), Vec::new());
        assert!(!store.has_save(sample_id()));
    }
}
