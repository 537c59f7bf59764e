//! Merge a freshly derived document into the stored reverse-index document.

use crate::types::IndexDocument;

/// Merge `incoming` over `existing`.
///
/// Body terms, title terms, visits and bookmarks are unioned; id, domain and
/// URL terms come from `incoming`; tags are carried over from `existing`.
/// `latest` is the larger of the two.
pub fn merge_documents(existing: Option<IndexDocument>, incoming: IndexDocument) -> IndexDocument {
    let Some(existing) = existing else {
        return incoming;
    };

    if existing.domain != incoming.domain {
        log::warn!(
            "domain changed for {}: {} -> {}",
            incoming.id,
            existing.domain,
            incoming.domain
        );
    }

    let IndexDocument {
        terms,
        title_terms,
        visits,
        bookmarks,
        tags,
        latest,
        ..
    } = existing;

    let mut merged = incoming;
    merged.terms.extend(terms);
    merged.title_terms.extend(title_terms);
    merged.visits.extend(visits);
    merged.bookmarks.extend(bookmarks);
    merged.tags = tags;
    merged.latest = merged.latest.max(latest);
    merged
}
