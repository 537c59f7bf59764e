//! Reads .mxi snapshots back into store entries.

use std::io::Read;
use std::path::Path;

use crate::store::MemoryStore;
use crate::types::error::{IndexError, IndexResult};
use crate::types::header::{SnapshotHeader, HEADER_SIZE};
use crate::types::StoredValue;

use super::compression::decompress_body;

/// Reader for .mxi snapshot files.
pub struct SnapshotReader;

impl SnapshotReader {
    /// Load a snapshot file into a fresh memory store.
    pub fn read_store(path: &Path) -> IndexResult<MemoryStore> {
        Ok(MemoryStore::from_entries(Self::read_from_file(path)?))
    }

    /// Read the entries of a snapshot file.
    pub fn read_from_file(path: &Path) -> IndexResult<Vec<(String, StoredValue)>> {
        let data = std::fs::read(path)?;
        let entries = Self::read_from(&mut std::io::Cursor::new(data))?;
        log::debug!("read {} entries from {}", entries.len(), path.display());
        Ok(entries)
    }

    /// Read just the header of a snapshot file.
    pub fn read_header(path: &Path) -> IndexResult<SnapshotHeader> {
        let mut file = std::fs::File::open(path)?;
        SnapshotHeader::read_from(&mut file)
    }

    /// Read entries from any reader.
    pub fn read_from(reader: &mut impl Read) -> IndexResult<Vec<(String, StoredValue)>> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let header_size = HEADER_SIZE as usize;
        if data.len() < header_size {
            return Err(IndexError::Truncated);
        }
        let header = SnapshotHeader::read_from(&mut std::io::Cursor::new(&data[..header_size]))?;

        let body_end = usize::try_from(header.body_length)
            .ok()
            .and_then(|len| header_size.checked_add(len))
            .filter(|end| *end <= data.len())
            .ok_or(IndexError::Truncated)?;

        let body = decompress_body(&data[header_size..body_end])?;
        let entries: Vec<(String, StoredValue)> = serde_json::from_slice(&body)?;

        if entries.len() as u64 != header.entry_count {
            log::warn!(
                "snapshot header says {} entries, body holds {}",
                header.entry_count,
                entries.len()
            );
            return Err(IndexError::Truncated);
        }

        Ok(entries)
    }
}
