//! File header for index snapshot files.

use std::io::{Read, Write};

use crate::types::error::{IndexError, IndexResult};
use crate::types::{FORMAT_VERSION, SNAPSHOT_MAGIC};

/// Header of a snapshot file. Fixed size: 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotHeader {
    /// Magic bytes: [0x4D, 0x58, 0x49, 0x58] ("MXIX").
    pub magic: [u8; 4],
    /// Format version (currently 1).
    pub version: u32,
    /// Number of key/value entries in the body.
    pub entry_count: u64,
    /// Length in bytes of the compressed body that follows the header.
    pub body_length: u64,
}

/// The fixed size of a SnapshotHeader on disk: 32 bytes.
pub const HEADER_SIZE: u64 = 32;

impl SnapshotHeader {
    /// Create a new header with default magic and version.
    pub fn new(entry_count: u64, body_length: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            entry_count,
            body_length,
        }
    }

    /// Write this header to the given writer. Writes exactly 32 bytes.
    ///
    /// Layout (all little-endian):
    /// - 0x00..0x04: magic (4 bytes)
    /// - 0x04..0x08: version (u32, 4 bytes)
    /// - 0x08..0x10: entry_count (u64, 8 bytes)
    /// - 0x10..0x18: body_length (u64, 8 bytes)
    /// - 0x18..0x20: _reserved (u64, 8 bytes, written as 0)
    pub fn write_to(&self, writer: &mut impl Write) -> IndexResult<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.entry_count.to_le_bytes())?;
        writer.write_all(&self.body_length.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?; // _reserved
        Ok(())
    }

    /// Read a header from the given reader. Reads exactly 32 bytes.
    pub fn read_from(reader: &mut impl Read) -> IndexResult<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                IndexError::Truncated
            } else {
                IndexError::Io(e)
            }
        })?;

        let magic = [buf[0], buf[1], buf[2], buf[3]];
        if magic != SNAPSHOT_MAGIC {
            return Err(IndexError::InvalidMagic);
        }

        let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion(version));
        }

        let entry_count = read_u64(&buf[8..16]);
        let body_length = read_u64(&buf[16..24]);
        // bytes 24..32 are reserved

        Ok(Self {
            magic,
            version,
            entry_count,
            body_length,
        })
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(bytes);
    u64::from_le_bytes(arr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let header = SnapshotHeader::new(7, 1234);
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_SIZE);
        assert_eq!(&buf[0..4], b"MXIX");

        let parsed = SnapshotHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = vec![0u8; HEADER_SIZE as usize];
        buf[0..4].copy_from_slice(b"NOPE");
        let err = SnapshotHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, IndexError::InvalidMagic));
    }

    #[test]
    fn test_short_header_is_truncated() {
        let err = SnapshotHeader::read_from(&mut Cursor::new(b"MXIX")).unwrap_err();
        assert!(matches!(err, IndexError::Truncated));
    }
}
