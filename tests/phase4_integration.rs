//! Phase 4 tests: end-to-end ingestion, concurrency, and snapshot persistence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use memex_index::config::IndexConfig;
use memex_index::engine::PageIndex;
use memex_index::format::{SnapshotReader, SnapshotWriter};
use memex_index::pipeline::{DocumentDeriver, PageDoc, PageSubmission, Pipeline};
use memex_index::store::{KeyValueStore, MemoryStore};
use memex_index::types::{IndexDocument, IndexError, IndexResult};

// ==================== Helpers ====================

const URL: &str = "https://www.example.com/guide/";
const PAGE: &str = "page/example.com/guide";

/// Default pipeline that sleeps for the page's first keyword (in ms) before answering.
struct SlowDeriver {
    inner: Pipeline,
}

#[async_trait]
impl DocumentDeriver for SlowDeriver {
    async fn derive(&self, req: PageSubmission) -> IndexResult<IndexDocument> {
        let delay = req
            .page
            .keywords
            .first()
            .and_then(|k| k.parse().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.inner.derive_document(&req)
    }
}

fn submission(text: &str) -> PageSubmission {
    PageSubmission::new(PageDoc::new(URL, text).with_title("Field Guide"))
}

async fn stored_page(store: &dyn KeyValueStore, id: &str) -> IndexDocument {
    store.get(id).await.unwrap().unwrap().into_page(id).unwrap()
}

// ==================== End to end ====================

#[tokio::test]
async fn test_submission_to_indexes() {
    let store = Arc::new(MemoryStore::new());
    let index = PageIndex::new(store.clone());

    let outcome = index
        .add_page_concurrent(submission("borrow checker lifetimes").with_visit(1_000))
        .await
        .unwrap();
    assert!(outcome.is_indexed());

    let doc = stored_page(store.as_ref(), PAGE).await;
    assert_eq!(doc.domain, "example.com");
    assert!(doc.terms.contains("borrow"));
    assert!(doc.title_terms.contains("field"));
    assert!(doc.url_terms.contains("guide"));

    assert!(store.get("example.com").await.unwrap().is_some());
    assert!(store.get("term/lifetimes").await.unwrap().is_some());
    assert!(store.get("url/guide").await.unwrap().is_some());
    assert!(store.get("title/guide").await.unwrap().is_some());
    assert!(store.get("visit/1000").await.unwrap().is_some());
}

#[tokio::test]
async fn test_url_variants_share_page() {
    let store = Arc::new(MemoryStore::new());
    let index = PageIndex::new(store.clone());

    let a = PageSubmission::new(PageDoc::new("http://example.com/guide", "rust"));
    let b = PageSubmission::new(PageDoc::new("https://www.example.com/guide/#intro", "tokio"));
    index.add_page(a).await.unwrap();
    index.add_page(b).await.unwrap();

    let doc = stored_page(store.as_ref(), PAGE).await;
    assert!(doc.terms.contains("rust"));
    assert!(doc.terms.contains("tokio"));
}

#[tokio::test]
async fn test_config_limits_terms() {
    let store = Arc::new(MemoryStore::new());
    let mut config = IndexConfig::default();
    config.tokenizer.max_terms = 2;
    let index = PageIndex::with_config(store.clone(), &config);

    index
        .add_page(submission("alpha beta gamma delta epsilon"))
        .await
        .unwrap();
    assert_eq!(stored_page(store.as_ref(), PAGE).await.terms.len(), 2);
}

#[tokio::test]
async fn test_invalid_url_rejected_before_writes() {
    let store = Arc::new(MemoryStore::new());
    let index = PageIndex::new(store.clone());

    let err = index
        .add_page_concurrent(PageSubmission::new(PageDoc::new("", "text")))
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Derivation(_)));
    assert_eq!(store.write_count(), 0);
}

// ==================== Concurrency ====================

#[tokio::test]
async fn test_racing_submissions_merge() {
    let store = Arc::new(MemoryStore::new());
    let deriver = Arc::new(SlowDeriver {
        inner: Pipeline::default(),
    });
    let index = PageIndex::with_deriver(store.clone(), deriver, 3000);

    // The first call derives slowest, so the second one reaches the queue first.
    let mut slow = submission("concurrency").with_visit(10);
    slow.page.keywords = vec!["40".into()];
    let mut fast = submission("parallelism").with_visit(20);
    fast.page.keywords = vec!["0".into()];

    let (a, b) = tokio::join!(index.add_page_concurrent(slow), index.add_page_concurrent(fast));
    assert!(a.unwrap().is_indexed());
    assert!(b.unwrap().is_indexed());

    let doc = stored_page(store.as_ref(), PAGE).await;
    assert!(doc.terms.contains("concurrency"));
    assert!(doc.terms.contains("parallelism"));
    assert!(doc.visits.contains("visit/10"));
    assert!(doc.visits.contains("visit/20"));
    assert_eq!(doc.latest, 20);
}

#[tokio::test]
async fn test_concurrent_bookmarks_are_not_lost() {
    let store = Arc::new(MemoryStore::new());
    let index = PageIndex::new(store.clone());
    index.add_page(submission("bookmarks")).await.unwrap();

    let adds = (1..=20u64).map(|t| index.add_bookmark_concurrent(PAGE, Some(t * 100)));
    for result in futures::future::join_all(adds).await {
        result.unwrap();
    }

    let doc = stored_page(store.as_ref(), PAGE).await;
    assert_eq!(doc.bookmarks.len(), 20);
    assert_eq!(doc.latest, 2000);
    assert_eq!(index.pending_writes(), 0);
}

#[tokio::test]
async fn test_queue_survives_precondition_failure() {
    let store = Arc::new(MemoryStore::new());
    let index = PageIndex::new(store.clone());

    let missing = index.add_timestamp_concurrent("page/nowhere.net", "visit/1", None);
    let page = index.add_page_concurrent(submission("recovery"));
    let (missing, page) = tokio::join!(missing, page);

    assert!(matches!(missing, Err(IndexError::PageNotFound(_))));
    assert!(page.unwrap().is_indexed());

    index
        .add_timestamp_concurrent(PAGE, "visit/55", None)
        .await
        .unwrap();
    index
        .update_timestamp_meta_concurrent("visit/55", |mut entry| {
            entry.meta.insert("read".into(), serde_json::json!(true));
            entry
        })
        .await
        .unwrap();

    let entry = store
        .get("visit/55")
        .await
        .unwrap()
        .unwrap()
        .into_timestamp("visit/55")
        .unwrap();
    assert_eq!(entry.page_id, PAGE);
    assert_eq!(entry.meta["read"], serde_json::json!(true));
}

// ==================== Persistence ====================

#[tokio::test]
async fn test_snapshot_round_trip_then_continue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.mxi");

    let store = Arc::new(MemoryStore::new());
    let index = PageIndex::new(store.clone());
    index
        .add_page(submission("snapshot persistence").with_visit(3))
        .await
        .unwrap();
    index
        .add_page(PageSubmission::new(PageDoc::new(
            "https://docs.rs/tokio",
            "runtime scheduler",
        )))
        .await
        .unwrap();
    SnapshotWriter::write_store(&store, &path).await.unwrap();

    let restored = Arc::new(SnapshotReader::read_store(&path).unwrap());
    assert_eq!(restored.entries().await, store.entries().await);

    let index = PageIndex::new(restored.clone());
    index
        .add_bookmark_concurrent(PAGE, Some(9))
        .await
        .unwrap();
    let doc = stored_page(restored.as_ref(), PAGE).await;
    assert!(doc.terms.contains("persistence"));
    assert!(doc.bookmarks.contains("bookmark/9"));
}
