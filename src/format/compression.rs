//! LZ4 compression of snapshot bodies.

use crate::types::error::{IndexError, IndexResult};

/// Compress a snapshot body with LZ4 (size prepended for decompression).
pub fn compress_body(body: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(body)
}

/// Decompress an LZ4 snapshot body.
pub fn decompress_body(data: &[u8]) -> IndexResult<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data).map_err(|e| IndexError::Compression(e.to_string()))
}
