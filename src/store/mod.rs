//! Sorted key/value store abstraction shared by every index.
//!
//! All indexes (page reverse index, postings, meta timestamps) live in one
//! store. Implementations must be `Send + Sync`; writes inside a single
//! [`WriteBatch`] become visible together.

pub mod memory;

use async_trait::async_trait;

use crate::types::{IndexResult, StoredValue};

pub use memory::MemoryStore;

/// Ordered key/value store consumed by the indexer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Point lookup. Missing keys are `Ok(None)`.
    async fn get(&self, key: &str) -> IndexResult<Option<StoredValue>>;

    /// Write a single key.
    async fn put(&self, key: &str, value: StoredValue) -> IndexResult<()>;

    /// Atomically apply every put in the batch.
    async fn write_batch(&self, batch: WriteBatch) -> IndexResult<()>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    async fn scan_prefix(&self, prefix: &str) -> IndexResult<Vec<(String, StoredValue)>>;
}

/// Accumulated puts committed as one atomic write.
#[derive(Debug, Default)]
pub struct WriteBatch {
    puts: Vec<(String, StoredValue)>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a put. Later puts to the same key win.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<StoredValue>) {
        self.puts.push((key.into(), value.into()));
    }

    /// Number of queued puts.
    pub fn len(&self) -> usize {
        self.puts.len()
    }

    /// Whether nothing was queued.
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    /// Consume the batch into its puts, in insertion order.
    pub fn into_puts(self) -> Vec<(String, StoredValue)> {
        self.puts
    }

    /// Commit to `store`. An empty batch does not touch the store.
    pub async fn commit(self, store: &dyn KeyValueStore) -> IndexResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        store.write_batch(self).await
    }
}
