//! All data types for the memex index.

pub mod document;
pub mod error;
pub mod header;
pub mod value;

pub use document::{IndexDocument, IndexDocumentBuilder};
pub use error::{IndexError, IndexResult};
pub use header::{SnapshotHeader, HEADER_SIZE};
pub use value::{MetaTimestampEntry, PostingEntry, Postings, StoredValue, TimestampValue};

/// Magic bytes at the start of every snapshot file.
pub const SNAPSHOT_MAGIC: [u8; 4] = [0x4D, 0x58, 0x49, 0x58]; // "MXIX"

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// Prefix of every page id (reverse-index key).
pub const PAGE_KEY_PREFIX: &str = "page/";

/// Prefix of visit timestamp keys.
pub const VISIT_KEY_PREFIX: &str = "visit/";

/// Prefix of bookmark timestamp keys.
pub const BOOKMARK_KEY_PREFIX: &str = "bookmark/";

/// Prefix of body-term posting keys.
pub const TERM_KEY_PREFIX: &str = "term/";

/// Prefix of URL-term posting keys.
pub const URL_KEY_PREFIX: &str = "url/";

/// Prefix of title-term posting keys.
pub const TITLE_KEY_PREFIX: &str = "title/";

/// Above this many keys a term lookup switches from point gets to one range scan.
pub const DEFAULT_TERMS_SIZE_LIMIT: usize = 3000;

/// Returns the current time as Unix epoch milliseconds.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Build the visit key for an event time.
pub fn visit_key(time: u64) -> String {
    format!("{VISIT_KEY_PREFIX}{time}")
}

/// Build the bookmark key for an event time.
pub fn bookmark_key(time: u64) -> String {
    format!("{BOOKMARK_KEY_PREFIX}{time}")
}

/// Parse the epoch time encoded in a visit or bookmark key.
pub fn timestamp_of_key(key: &str) -> Option<u64> {
    key.strip_prefix(VISIT_KEY_PREFIX)
        .or_else(|| key.strip_prefix(BOOKMARK_KEY_PREFIX))
        .and_then(|t| t.parse().ok())
}
