//! In-memory ordered store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueStore, WriteBatch};
use crate::types::{IndexResult, StoredValue};

/// `BTreeMap`-backed store. Cheap to snapshot with [`MemoryStore::entries`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, StoredValue>>,
    /// Mutating calls seen: one per put, one per non-empty batch.
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from previously captured entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, StoredValue)>) -> Self {
        Self {
            data: RwLock::new(entries.into_iter().collect()),
            writes: AtomicU64::new(0),
        }
    }

    /// Ordered copy of every entry.
    pub async fn entries(&self) -> Vec<(String, StoredValue)> {
        self.data
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of keys.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Number of mutating calls since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> IndexResult<Option<StoredValue>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: StoredValue) -> IndexResult<()> {
        self.data.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write_batch(&self, batch: WriteBatch) -> IndexResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        // Single write guard: readers never observe half a batch.
        let mut data = self.data.write().await;
        for (key, value) in batch.into_puts() {
            data.insert(key, value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> IndexResult<Vec<(String, StoredValue)>> {
        let data = self.data.read().await;
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
