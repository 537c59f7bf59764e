//! Public entry points for indexing pages and timestamps.

use std::sync::Arc;

use crate::config::IndexConfig;
use crate::engine::fanout::{FanOutIndexer, IndexOutcome};
use crate::engine::queue::WriteQueue;
use crate::pipeline::{DocumentDeriver, PageSubmission, Pipeline};
use crate::store::KeyValueStore;
use crate::types::{now_millis, IndexResult, MetaTimestampEntry, StoredValue};

/// Incrementally-updated page index over a shared key/value store.
///
/// The `*_concurrent` operations go through one [`WriteQueue`] so that
/// overlapping read-merge-write sequences never interleave. `add_page` does
/// not, and is meant for single-writer use such as bulk imports.
pub struct PageIndex {
    indexer: Arc<FanOutIndexer>,
    deriver: Arc<dyn DocumentDeriver>,
    queue: WriteQueue,
}

impl PageIndex {
    /// Index with the default pipeline and lookup threshold.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, &IndexConfig::default())
    }

    /// Index configured from `config`.
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: &IndexConfig) -> Self {
        let deriver = Arc::new(Pipeline::new(config.tokenizer.clone()));
        Self::with_deriver(store, deriver, config.terms_size_limit)
    }

    /// Index using a custom derivation pipeline.
    pub fn with_deriver(
        store: Arc<dyn KeyValueStore>,
        deriver: Arc<dyn DocumentDeriver>,
        terms_size_limit: usize,
    ) -> Self {
        Self {
            indexer: Arc::new(FanOutIndexer::with_terms_size_limit(
                store,
                terms_size_limit,
            )),
            deriver,
            queue: WriteQueue::new(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        self.indexer.store()
    }

    /// Write jobs admitted but not yet finished.
    pub fn pending_writes(&self) -> usize {
        self.queue.pending()
    }

    /// Read a raw value.
    pub async fn get(&self, key: &str) -> IndexResult<Option<StoredValue>> {
        self.store().get(key).await
    }

    /// Write a raw value directly, bypassing the queue.
    pub async fn put(&self, key: &str, value: StoredValue) -> IndexResult<()> {
        self.store().put(key, value).await
    }

    /// Derive and index a page without queuing.
    pub async fn add_page(&self, req: PageSubmission) -> IndexResult<IndexOutcome> {
        let doc = self.deriver.derive(req).await?;
        Ok(self.indexer.perform_indexing(doc).await)
    }

    /// Derive a page, then index it on the write queue.
    ///
    /// Derivation runs before admission, so slow derivations do not hold
    /// the queue; the queued merge makes the final state independent of
    /// which of two racing derivations finishes first.
    pub async fn add_page_concurrent(&self, req: PageSubmission) -> IndexResult<IndexOutcome> {
        let doc = self.deriver.derive(req).await?;
        let indexer = Arc::clone(&self.indexer);
        self.queue
            .push(move || async move { Ok(indexer.perform_indexing(doc).await) })
            .await
    }

    /// Bookmark an indexed page at `timestamp` (now when `None`).
    pub async fn add_bookmark_concurrent(
        &self,
        page_id: impl Into<String>,
        timestamp: Option<u64>,
    ) -> IndexResult<()> {
        let page_id = page_id.into();
        let timestamp = timestamp.unwrap_or_else(now_millis);
        let indexer = Arc::clone(&self.indexer);
        self.queue
            .push(move || async move { indexer.add_bookmark(&page_id, timestamp).await })
            .await
    }

    /// Attach a visit or bookmark key, with optional metadata, to an indexed page.
    pub async fn add_timestamp_concurrent(
        &self,
        page_id: impl Into<String>,
        timestamp_key: impl Into<String>,
        meta: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> IndexResult<()> {
        let page_id = page_id.into();
        let timestamp_key = timestamp_key.into();
        let meta = meta.unwrap_or_default();
        let indexer = Arc::clone(&self.indexer);
        self.queue
            .push(move || async move {
                indexer
                    .add_timestamp(&page_id, &timestamp_key, meta)
                    .await
            })
            .await
    }

    /// Replace the metadata of an existing timestamp entry.
    pub async fn update_timestamp_meta_concurrent<F>(
        &self,
        timestamp_id: impl Into<String>,
        update: F,
    ) -> IndexResult<()>
    where
        F: FnOnce(MetaTimestampEntry) -> MetaTimestampEntry + Send + 'static,
    {
        let timestamp_id = timestamp_id.into();
        let indexer = Arc::clone(&self.indexer);
        self.queue
            .push(move || async move {
                indexer
                    .update_timestamp_meta(&timestamp_id, update)
                    .await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PageDoc;
    use crate::store::MemoryStore;
    use crate::types::IndexError;

    fn index() -> PageIndex {
        PageIndex::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_page_and_bookmark() {
        let index = index();
        let req = PageSubmission::new(PageDoc::new("https://example.com/post", "async runtimes"))
            .with_visit(5);
        let outcome = index.add_page_concurrent(req).await.unwrap();
        assert!(outcome.is_indexed());

        index
            .add_bookmark_concurrent("page/example.com/post", Some(50))
            .await
            .unwrap();

        let doc = index
            .get("page/example.com/post")
            .await
            .unwrap()
            .unwrap()
            .into_page("page/example.com/post")
            .unwrap();
        assert!(doc.bookmarks.contains("bookmark/50"));
        assert_eq!(doc.latest, 50);
        assert_eq!(index.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_bookmark_unknown_page() {
        let err = index()
            .add_bookmark_concurrent("page/missing.org", Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::PageNotFound(_)));
    }

    #[tokio::test]
    async fn test_derivation_failure_is_raised() {
        let req = PageSubmission::new(PageDoc::new("http://", "text"));
        let err = index().add_page(req).await.unwrap_err();
        assert!(matches!(err, IndexError::Derivation(_)));
    }
}
