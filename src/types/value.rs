//! Values stored in the key/value store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::IndexDocument;
use super::error::{IndexError, IndexResult};

/// Metadata key that identifies the owning page of a timestamp entry.
const PAGE_ID_FIELD: &str = "pageId";

/// Freshness metadata for one page inside a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingEntry {
    /// Latest visit/bookmark time of the page, for scoring.
    pub latest: u64,
}

/// Posting mapping (page id -> freshness) stored under a term or domain key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Postings {
    entries: BTreeMap<String, PostingEntry>,
}

impl Postings {
    /// Create an empty posting mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a page.
    pub fn upsert(&mut self, page_id: impl Into<String>, latest: u64) {
        self.entries.insert(page_id.into(), PostingEntry { latest });
    }

    /// Entry for a page, if present.
    pub fn get(&self, page_id: &str) -> Option<&PostingEntry> {
        self.entries.get(page_id)
    }

    /// Whether the page has an entry.
    pub fn contains(&self, page_id: &str) -> bool {
        self.entries.contains_key(page_id)
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the posting is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A visit or bookmark event entry: owning page plus arbitrary metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaTimestampEntry {
    /// Owning page. Immutable once written.
    #[serde(rename = "pageId")]
    pub page_id: String,
    /// Extra metadata stored alongside the event.
    #[serde(flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl MetaTimestampEntry {
    /// Create an entry with no metadata.
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            meta: serde_json::Map::new(),
        }
    }

    /// Create an entry with metadata. A `pageId` key in `meta` is discarded.
    pub fn with_meta(
        page_id: impl Into<String>,
        mut meta: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        meta.remove(PAGE_ID_FIELD);
        Self {
            page_id: page_id.into(),
            meta,
        }
    }

    /// Pin the owner to `page_id`, dropping any smuggled `pageId` metadata.
    pub(crate) fn reattach_owner(mut self, page_id: &str) -> Self {
        self.page_id = page_id.to_string();
        self.meta.remove(PAGE_ID_FIELD);
        self
    }
}

/// Shape of a meta-timestamp value as found in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    /// Older versions stored the bare page id.
    Legacy(String),
    /// Structured entry.
    Entry(MetaTimestampEntry),
}

impl TimestampValue {
    /// Normalize either shape into a structured entry.
    pub fn normalize(self) -> MetaTimestampEntry {
        match self {
            Self::Legacy(page_id) => MetaTimestampEntry::new(page_id),
            Self::Entry(entry) => entry,
        }
    }
}

/// Every value kind the index writes, tagged at the storage boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    /// Page reverse-index document.
    Page(IndexDocument),
    /// Term, URL-term, title-term or domain posting.
    Postings(Postings),
    /// Visit or bookmark meta entry.
    Timestamp(TimestampValue),
}

impl StoredValue {
    /// Human-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Postings(_) => "postings",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Unwrap a page document, failing if `key` holds something else.
    pub fn into_page(self, key: &str) -> IndexResult<IndexDocument> {
        match self {
            Self::Page(doc) => Ok(doc),
            _ => Err(unexpected(key, "page")),
        }
    }

    /// Unwrap a posting mapping, failing if `key` holds something else.
    pub fn into_postings(self, key: &str) -> IndexResult<Postings> {
        match self {
            Self::Postings(postings) => Ok(postings),
            _ => Err(unexpected(key, "postings")),
        }
    }

    /// Unwrap and normalize a timestamp entry, failing if `key` holds something else.
    pub fn into_timestamp(self, key: &str) -> IndexResult<MetaTimestampEntry> {
        match self {
            Self::Timestamp(value) => Ok(value.normalize()),
            _ => Err(unexpected(key, "timestamp")),
        }
    }
}

fn unexpected(key: &str, expected: &'static str) -> IndexError {
    IndexError::UnexpectedValue {
        key: key.to_string(),
        expected,
    }
}

impl From<IndexDocument> for StoredValue {
    fn from(doc: IndexDocument) -> Self {
        Self::Page(doc)
    }
}

impl From<Postings> for StoredValue {
    fn from(postings: Postings) -> Self {
        Self::Postings(postings)
    }
}

impl From<MetaTimestampEntry> for StoredValue {
    fn from(entry: MetaTimestampEntry) -> Self {
        Self::Timestamp(TimestampValue::Entry(entry))
    }
}
