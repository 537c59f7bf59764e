//! Writes .mxi snapshots from store entries.

use std::io::Write;
use std::path::Path;

use crate::store::MemoryStore;
use crate::types::error::IndexResult;
use crate::types::header::SnapshotHeader;
use crate::types::StoredValue;

use super::compression::compress_body;

/// Writer for .mxi snapshot files.
pub struct SnapshotWriter;

impl SnapshotWriter {
    /// Write every entry of `store` to a snapshot file.
    pub async fn write_store(store: &MemoryStore, path: &Path) -> IndexResult<()> {
        let entries = store.entries().await;
        Self::write_to_file(&entries, path)
    }

    /// Write entries to a snapshot file, replacing it.
    pub fn write_to_file(entries: &[(String, StoredValue)], path: &Path) -> IndexResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        Self::write_to(entries, &mut writer)?;
        writer.flush()?;
        log::debug!("wrote {} entries to {}", entries.len(), path.display());
        Ok(())
    }

    /// Write entries to any writer: header, then the compressed JSON body.
    pub fn write_to(entries: &[(String, StoredValue)], writer: &mut impl Write) -> IndexResult<()> {
        let body = serde_json::to_vec(entries)?;
        let compressed = compress_body(&body);

        let header = SnapshotHeader::new(entries.len() as u64, compressed.len() as u64);
        header.write_to(writer)?;
        writer.write_all(&compressed)?;
        Ok(())
    }
}
