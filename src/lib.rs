//! memex index — incrementally-updated multi-index store for personal web history.
//!
//! Pages are derived into [`IndexDocument`]s and fanned out across several
//! indexes that share one sorted key/value store: a page reverse index,
//! term/URL/title/domain postings, and visit/bookmark meta entries. Every
//! update is a read-merge-write, so re-ingesting a page only ever adds to
//! what is already indexed.

pub mod cli;
pub mod config;
pub mod engine;
pub mod format;
pub mod index;
pub mod pipeline;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{load_config, IndexConfig, TokenizerConfig};
pub use engine::{FanOutIndexer, IndexOutcome, IndexStage, PageIndex, StageFailure, WriteQueue};
pub use format::{SnapshotReader, SnapshotWriter};
pub use index::{merge_documents, reduce_term_value, TermField};
pub use pipeline::{DocumentDeriver, PageDoc, PageSubmission, Pipeline};
pub use store::{KeyValueStore, MemoryStore, WriteBatch};
pub use types::{
    now_millis, IndexDocument, IndexDocumentBuilder, IndexError, IndexResult, MetaTimestampEntry,
    Postings, StoredValue,
};
