//! Bundle header structure and parsing

use binrw::io::{Read, Seek, Write};
use binrw::{BinRead, BinResult, BinWrite};

use super::error::BundleError;

/// Bundle magic bytes
pub const BUNDLE_MAGIC: [u8; 4] = *b"3DSS";

/// Serialized header size in bytes
pub const HEADER_SIZE: usize = 28;

/// Current format version (zlib-compressed payload)
pub const FORMAT_VERSION: u32 = 2;

/// Legacy format version (raw payload)
pub const LEGACY_VERSION: u32 = 1;

/// Bundle file header
///
/// Little-endian throughout except the title id, which is big-endian so
/// that the id reads in natural order in a hex dump of the wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHeader {
    /// Magic bytes (always "3DSS")
    pub magic: [u8; 4],
    /// Format version, 1 or 2
    pub version: u32,
    /// Title the payload belongs to
    pub title_id: u64,
    /// Creation time, seconds since the Unix epoch
    pub timestamp: u32,
    /// Number of files in the payload table
    pub file_count: u32,
    /// v1: total payload size; v2: uncompressed payload size
    pub payload_size: u32,
}

impl BinRead for BundleHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if magic != BUNDLE_MAGIC {
            return Err(binrw::Error::Custom {
                pos: 0,
                err: Box::new(BundleError::InvalidMagic(magic)),
            });
        }

        let version = u32::read_options(reader, binrw::Endian::Little, ())?;
        if version != LEGACY_VERSION && version != FORMAT_VERSION {
            return Err(binrw::Error::Custom {
                pos: 4,
                err: Box::new(BundleError::UnsupportedVersion(version)),
            });
        }

        // Title id is the one big-endian field
        let title_id = u64::read_options(reader, binrw::Endian::Big, ())?;
        let timestamp = u32::read_options(reader, binrw::Endian::Little, ())?;
        let file_count = u32::read_options(reader, binrw::Endian::Little, ())?;
        let payload_size = u32::read_options(reader, binrw::Endian::Little, ())?;

        Ok(Self {
            magic,
            version,
            title_id,
            timestamp,
            file_count,
            payload_size,
        })
    }
}

impl BinWrite for BundleHeader {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&self.magic)?;
        self.version
            .write_options(writer, binrw::Endian::Little, ())?;
        self.title_id.write_options(writer, binrw::Endian::Big, ())?;
        self.timestamp
            .write_options(writer, binrw::Endian::Little, ())?;
        self.file_count
            .write_options(writer, binrw::Endian::Little, ())?;
        self.payload_size
            .write_options(writer, binrw::Endian::Little, ())?;
        Ok(())
    }
}

impl BundleHeader {
    /// Create a current-version header
    pub fn new(title_id: u64, timestamp: u32, file_count: u32, payload_size: u32) -> Self {
        Self {
            magic: BUNDLE_MAGIC,
            version: FORMAT_VERSION,
            title_id,
            timestamp,
            file_count,
            payload_size,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    fn write_header(header: &BundleHeader) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        header
            .write_options(&mut cursor, binrw::Endian::Little, ())
            .expect("in-memory write should succeed");
        buf
    }

    #[test]
    fn test_header_layout() {
        let header = BundleHeader::new(0x1122_3344_5566_7788, 0x0102_0304, 2, 0x0A0B_0C0D);
        let bytes = write_header(&header);

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"3DSS");
        // Version, little-endian
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        // Title id, big-endian
        assert_eq!(
            &bytes[8..16],
            &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
        // Timestamp, little-endian
        assert_eq!(&bytes[16..20], &[0x04, 0x03, 0x02, 0x01]);
        // File count, little-endian
        assert_eq!(&bytes[20..24], &[2, 0, 0, 0]);
        // Payload size, little-endian
        assert_eq!(&bytes[24..28], &[0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[test]
    fn test_header_round_trip() {
        let header = BundleHeader::new(0xFFEE_DDCC_BBAA_0099, 1_700_000_000, 7, 12345);
        let bytes = write_header(&header);

        let mut cursor = Cursor::new(&bytes);
        let parsed = BundleHeader::read_options(&mut cursor, binrw::Endian::Little, ())
            .expect("round trip should parse");
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let header = BundleHeader::new(1, 2, 3, 4);
        let mut bytes = write_header(&header);
        bytes[0] = b'X';

        let mut cursor = Cursor::new(&bytes);
        assert!(BundleHeader::read_options(&mut cursor, binrw::Endian::Little, ()).is_err());
    }

    #[test]
    fn test_header_rejects_unknown_version() {
        let mut header = BundleHeader::new(1, 2, 3, 4);
        header.version = 3;
        let bytes = write_header(&header);

        let mut cursor = Cursor::new(&bytes);
        assert!(BundleHeader::read_options(&mut cursor, binrw::Endian::Little, ()).is_err());
    }

    #[test]
    fn test_header_accepts_legacy_version() {
        let mut header = BundleHeader::new(1, 2, 3, 4);
        header.version = LEGACY_VERSION;
        let bytes = write_header(&header);

        let mut cursor = Cursor::new(&bytes);
        let parsed = BundleHeader::read_options(&mut cursor, binrw::Endian::Little, ())
            .expect("v1 headers parse");
        assert_eq!(parsed.version, LEGACY_VERSION);
    }
}
