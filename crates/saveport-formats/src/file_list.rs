//! Ordered save file lists

/// Upper bound (exclusive) on bundle path byte lengths
pub const MAX_PATH_LEN: usize = 256;

/// One entry of an ordered save file list
///
/// `path` is a relative UTF-8 path without a leading separator, at most
/// [`MAX_PATH_LEN`]` - 1` bytes. `data` is opaque. List order is
/// significant: the content hash of a save covers file bytes in list
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFile {
    /// Relative path within the save
    pub path: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

impl SaveFile {
    /// Create a save file entry
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

/// Total byte size of a file list
pub fn total_size(files: &[SaveFile]) -> u64 {
    files.iter().map(|f| f.data.len() as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size() {
        let files = vec![
            SaveFile::new("a", vec![0; 10]),
            SaveFile::new("b", vec![0; 32]),
        ];
        assert_eq!(total_size(&files), 42);
        assert_eq!(total_size(&[]), 0);
    }
}
