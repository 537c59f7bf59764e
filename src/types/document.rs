//! The index document — the mergeable reverse-index record of one page.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::timestamp_of_key;

/// Derived representation of a page plus its terms and event sets.
///
/// Stored under its own `id` as the page reverse index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    /// Stable page identifier derived from the page URL.
    pub id: String,
    /// Host of the page URL.
    pub domain: String,
    /// Body tokens.
    #[serde(default)]
    pub terms: BTreeSet<String>,
    /// URL tokens.
    #[serde(default)]
    pub url_terms: BTreeSet<String>,
    /// Title tokens.
    #[serde(default)]
    pub title_terms: BTreeSet<String>,
    /// Visit timestamp keys.
    #[serde(default)]
    pub visits: BTreeSet<String>,
    /// Bookmark timestamp keys.
    #[serde(default)]
    pub bookmarks: BTreeSet<String>,
    /// User tags. Only ever carried over from stored state.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Most recent associated event time (epoch millis).
    #[serde(default)]
    pub latest: u64,
}

impl IndexDocument {
    /// Create an empty document for a page id and domain.
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// Whether the document has no body terms (nothing worth indexing).
    pub fn has_no_terms(&self) -> bool {
        self.terms.is_empty()
    }

    /// All visit and bookmark keys, bookmarks first.
    pub fn timestamp_keys(&self) -> impl Iterator<Item = &String> {
        self.bookmarks.iter().chain(self.visits.iter())
    }

    /// Recompute `latest` from the event keys, never moving it backwards.
    pub fn refresh_latest(&mut self) {
        let newest = self
            .timestamp_keys()
            .filter_map(|k| timestamp_of_key(k))
            .max()
            .unwrap_or(0);
        self.latest = self.latest.max(newest);
    }
}

/// Builder for constructing IndexDocument instances ergonomically.
pub struct IndexDocumentBuilder {
    doc: IndexDocument,
}

impl IndexDocumentBuilder {
    /// Create a new builder with the required fields.
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            doc: IndexDocument::new(id, domain),
        }
    }

    /// Add body terms.
    pub fn terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doc.terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Add URL terms.
    pub fn url_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doc.url_terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Add title terms.
    pub fn title_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doc.title_terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Add a visit key.
    pub fn visit(mut self, key: impl Into<String>) -> Self {
        self.doc.visits.insert(key.into());
        self
    }

    /// Add a bookmark key.
    pub fn bookmark(mut self, key: impl Into<String>) -> Self {
        self.doc.bookmarks.insert(key.into());
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.doc.tags.insert(tag.into());
        self
    }

    /// Set the latest timestamp explicitly.
    pub fn latest(mut self, latest: u64) -> Self {
        self.doc.latest = latest;
        self
    }

    /// Build the IndexDocument. `latest` is raised to the newest event key.
    pub fn build(self) -> IndexDocument {
        let mut doc = self.doc;
        doc.refresh_latest();
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{bookmark_key, visit_key};

    #[test]
    fn test_builder_computes_latest() {
        let doc = IndexDocumentBuilder::new("page/a.com", "a.com")
            .terms(["alpha"])
            .visit(visit_key(10))
            .bookmark(bookmark_key(30))
            .visit(visit_key(20))
            .build();
        assert_eq!(doc.latest, 30);
    }

    #[test]
    fn test_refresh_latest_never_decreases() {
        let mut doc = IndexDocumentBuilder::new("page/a.com", "a.com")
            .latest(500)
            .visit(visit_key(100))
            .build();
        doc.refresh_latest();
        assert_eq!(doc.latest, 500);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let doc = IndexDocumentBuilder::new("page/a.com", "a.com")
            .url_terms(["a"])
            .build();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("urlTerms").is_some());
        assert!(json.get("titleTerms").is_some());
    }
}
