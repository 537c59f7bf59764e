//! Fan-out indexer — applies one page document to every derived index.
//!
//! Stage order for a page: the reverse index is read, merged and written
//! first; domain, URL-term, title-term and body-term postings then run
//! concurrently from the merged document, alongside the meta-timestamp stage
//! which works from the pre-merge document so that only new events are
//! written.
//!
//! None of these methods serialize themselves. Callers that may race on the
//! same keys go through [`crate::engine::WriteQueue`].

use std::sync::Arc;
use std::time::Instant;

use crate::index::{
    fetch_existing_page, fetch_page, lookup_by_keys, lookup_terms, merge_documents,
    reduce_term_value, TermField,
};
use crate::store::{KeyValueStore, WriteBatch};
use crate::types::{
    bookmark_key, IndexDocument, IndexError, IndexResult, MetaTimestampEntry,
    DEFAULT_TERMS_SIZE_LIMIT, VISIT_KEY_PREFIX,
};

/// One step of the page fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexStage {
    Page,
    Domain,
    UrlTerms,
    TitleTerms,
    Terms,
    MetaTimestamps,
}

impl IndexStage {
    /// Return a human-readable name for this stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Domain => "domain",
            Self::UrlTerms => "url terms",
            Self::TitleTerms => "title terms",
            Self::Terms => "terms",
            Self::MetaTimestamps => "meta timestamps",
        }
    }
}

impl std::fmt::Display for IndexStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A stage that failed during fan-out.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: IndexStage,
    pub error: IndexError,
}

/// Result of a page fan-out. Failures are reported here instead of raised.
#[derive(Debug)]
pub enum IndexOutcome {
    /// Every stage succeeded; carries the merged reverse-index document.
    Indexed(IndexDocument),
    /// Some stages failed. `document` is `None` when the page stage itself failed.
    Partial {
        document: Option<IndexDocument>,
        failures: Vec<StageFailure>,
    },
    /// The document had no body terms; nothing was written.
    Skipped,
}

impl IndexOutcome {
    /// Whether every stage succeeded.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(_))
    }

    /// Whether the document was skipped for having no terms.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The merged document, if the page stage succeeded.
    pub fn document(&self) -> Option<&IndexDocument> {
        match self {
            Self::Indexed(doc) => Some(doc),
            Self::Partial { document, .. } => document.as_ref(),
            Self::Skipped => None,
        }
    }

    /// Failed stages (empty unless partial).
    pub fn failures(&self) -> &[StageFailure] {
        match self {
            Self::Partial { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Writes merged page documents across all derived indexes.
pub struct FanOutIndexer {
    store: Arc<dyn KeyValueStore>,
    terms_size_limit: usize,
}

impl FanOutIndexer {
    /// Create an indexer with the default lookup threshold.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_terms_size_limit(store, DEFAULT_TERMS_SIZE_LIMIT)
    }

    /// Create an indexer that range-scans term sets larger than `limit`.
    pub fn with_terms_size_limit(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            terms_size_limit: limit,
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read-merge-write the page reverse index. Returns the merged document.
    pub async fn index_page(&self, doc: &IndexDocument) -> IndexResult<IndexDocument> {
        let existing = fetch_page(self.store.as_ref(), &doc.id).await?;
        let mut merged = merge_documents(existing, doc.clone());
        merged.refresh_latest();
        self.store.put(&merged.id, merged.clone().into()).await?;
        Ok(merged)
    }

    /// Read-merge-write the domain posting.
    pub async fn index_domain(&self, doc: &IndexDocument) -> IndexResult<()> {
        let existing = self
            .store
            .get(&doc.domain)
            .await?
            .map(|v| v.into_postings(&doc.domain))
            .transpose()?;
        self.store
            .put(&doc.domain, reduce_term_value(existing, doc).into())
            .await
    }

    /// Update every posting of one term field in a single batch.
    pub async fn index_terms(&self, field: TermField, doc: &IndexDocument) -> IndexResult<()> {
        let keys = field.keys(doc);
        if keys.is_empty() {
            return Ok(());
        }

        let current = lookup_terms(
            self.store.as_ref(),
            field.prefix(),
            &keys,
            self.terms_size_limit,
        )
        .await?;

        let mut batch = WriteBatch::new();
        for (key, value) in current {
            let existing = value.map(|v| v.into_postings(&key)).transpose()?;
            batch.put(key, reduce_term_value(existing, doc));
        }
        batch.commit(self.store.as_ref()).await
    }

    /// Write meta entries for event keys of `doc` not yet in the store.
    ///
    /// Pass the pre-merge document: events already merged into the reverse
    /// index from earlier ingestions must not be rewritten.
    pub async fn index_meta_timestamps(&self, doc: &IndexDocument) -> IndexResult<()> {
        let current = lookup_by_keys(self.store.as_ref(), doc.timestamp_keys()).await?;

        let mut batch = WriteBatch::new();
        for (key, value) in current {
            if value.is_none() {
                batch.put(key, MetaTimestampEntry::new(doc.id.clone()));
            }
        }
        batch.commit(self.store.as_ref()).await
    }

    /// Run the whole fan-out for a derived document. Never fails: stage
    /// errors are logged and reported in the outcome.
    pub async fn perform_indexing(&self, doc: IndexDocument) -> IndexOutcome {
        if doc.has_no_terms() {
            log::debug!("skipping {}: no terms", doc.id);
            return IndexOutcome::Skipped;
        }

        let started = Instant::now();

        let merged = match self.index_page(&doc).await {
            Ok(merged) => merged,
            Err(error) => {
                log::error!("page indexing failed for {}: {}", doc.id, error);
                return IndexOutcome::Partial {
                    document: None,
                    failures: vec![StageFailure {
                        stage: IndexStage::Page,
                        error,
                    }],
                };
            }
        };

        let (domain, url_terms, title_terms, terms, meta) = tokio::join!(
            self.index_domain(&merged),
            self.index_terms(TermField::Url, &merged),
            self.index_terms(TermField::Title, &merged),
            self.index_terms(TermField::Body, &merged),
            self.index_meta_timestamps(&doc),
        );

        let failures: Vec<StageFailure> = [
            (IndexStage::Domain, domain),
            (IndexStage::UrlTerms, url_terms),
            (IndexStage::TitleTerms, title_terms),
            (IndexStage::Terms, terms),
            (IndexStage::MetaTimestamps, meta),
        ]
        .into_iter()
        .filter_map(|(stage, result)| result.err().map(|error| StageFailure { stage, error }))
        .collect();

        log::debug!("indexing page {} took {:?}", merged.id, started.elapsed());

        if failures.is_empty() {
            log::info!(
                "indexed {} ({} terms, {} visits, {} bookmarks)",
                merged.id,
                merged.terms.len(),
                merged.visits.len(),
                merged.bookmarks.len()
            );
            IndexOutcome::Indexed(merged)
        } else {
            for failure in &failures {
                log::error!(
                    "{} indexing failed for {}: {}",
                    failure.stage,
                    merged.id,
                    failure.error
                );
            }
            IndexOutcome::Partial {
                document: Some(merged),
                failures,
            }
        }
    }

    /// Attach a new bookmark to an indexed page.
    ///
    /// An entry already stored under the bookmark key for the same page keeps
    /// its metadata. One owned by another page is replaced.
    pub async fn add_bookmark(&self, page_id: &str, timestamp: u64) -> IndexResult<()> {
        let mut doc = fetch_existing_page(self.store.as_ref(), page_id).await?;
        let key = bookmark_key(timestamp);

        let entry = self
            .timestamp_entry(&key, page_id, serde_json::Map::new())
            .await?;
        self.store.put(&key, entry.into()).await?;

        doc.bookmarks.insert(key);
        doc.refresh_latest();
        self.store.put(page_id, doc.into()).await
    }

    /// Attach a visit or bookmark key (by prefix) to an indexed page and
    /// write its meta entry.
    ///
    /// `meta` is merged over the metadata of an entry already stored under
    /// the key for the same page. An entry owned by another page is replaced.
    pub async fn add_timestamp(
        &self,
        page_id: &str,
        timestamp_key: &str,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> IndexResult<()> {
        let mut doc = fetch_existing_page(self.store.as_ref(), page_id).await?;
        let entry = self.timestamp_entry(timestamp_key, page_id, meta).await?;

        if timestamp_key.starts_with(VISIT_KEY_PREFIX) {
            doc.visits.insert(timestamp_key.to_string());
        } else {
            doc.bookmarks.insert(timestamp_key.to_string());
        }
        doc.refresh_latest();
        self.store.put(page_id, doc.into()).await?;

        self.store.put(timestamp_key, entry.into()).await
    }

    /// Entry to store under `key` for `page_id`, folding in an existing one.
    async fn timestamp_entry(
        &self,
        key: &str,
        page_id: &str,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> IndexResult<MetaTimestampEntry> {
        let incoming = MetaTimestampEntry::with_meta(page_id, meta);
        let existing = match self.store.get(key).await? {
            Some(value) => value.into_timestamp(key)?,
            None => return Ok(incoming),
        };

        if existing.page_id != page_id {
            log::warn!(
                "{} moves from {} to {}",
                key,
                existing.page_id,
                page_id
            );
            return Ok(incoming);
        }

        let mut merged = existing;
        merged.meta.extend(incoming.meta);
        Ok(merged)
    }

    /// Replace a meta entry with `update(existing)`. The owning page id
    /// cannot be changed by `update`.
    pub async fn update_timestamp_meta<F>(&self, timestamp_id: &str, update: F) -> IndexResult<()>
    where
        F: FnOnce(MetaTimestampEntry) -> MetaTimestampEntry,
    {
        let existing = self
            .store
            .get(timestamp_id)
            .await?
            .ok_or_else(|| IndexError::TimestampNotFound(timestamp_id.to_string()))?
            .into_timestamp(timestamp_id)?;

        let owner = existing.page_id.clone();
        let updated = update(existing).reattach_owner(&owner);
        self.store.put(timestamp_id, updated.into()).await
    }
}
