//! Lookup strategies — resolve a set of keys to their current values.
//!
//! Small key sets are resolved with one point lookup per key. Past the
//! configured limit a single ordered prefix scan is cheaper, so the scan is
//! filtered down to the requested keys instead. Both strategies return an
//! entry for every requested key.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::try_join_all;

use crate::store::KeyValueStore;
use crate::types::{IndexDocument, IndexError, IndexResult, StoredValue};

/// Requested key -> current value (`None` when absent).
pub type LookupResult = BTreeMap<String, Option<StoredValue>>;

/// Fetch a single key.
pub async fn single_lookup(
    store: &dyn KeyValueStore,
    key: &str,
) -> IndexResult<Option<StoredValue>> {
    store.get(key).await
}

/// Resolve every key with its own point lookup.
pub async fn lookup_by_keys<'a, I>(store: &dyn KeyValueStore, keys: I) -> IndexResult<LookupResult>
where
    I: IntoIterator<Item = &'a String>,
{
    let lookups = keys.into_iter().map(|key| async move {
        let value = store.get(key).await?;
        Ok::<_, IndexError>((key.clone(), value))
    });
    Ok(try_join_all(lookups).await?.into_iter().collect())
}

/// Resolve `keys` (all sharing `prefix`) with one ordered range scan.
pub async fn term_range_lookup(
    store: &dyn KeyValueStore,
    prefix: &str,
    keys: &BTreeSet<String>,
) -> IndexResult<LookupResult> {
    let mut result: LookupResult = keys.iter().map(|k| (k.clone(), None)).collect();

    for (key, value) in store.scan_prefix(prefix).await? {
        if let Some(slot) = result.get_mut(&key) {
            *slot = Some(value);
        }
    }

    Ok(result)
}

/// Pick the strategy by cardinality: range scan above `limit`, point lookups otherwise.
pub async fn lookup_terms(
    store: &dyn KeyValueStore,
    prefix: &str,
    keys: &BTreeSet<String>,
    limit: usize,
) -> IndexResult<LookupResult> {
    if keys.len() > limit {
        log::debug!("range lookup over {prefix} for {} keys", keys.len());
        term_range_lookup(store, prefix, keys).await
    } else {
        lookup_by_keys(store, keys).await
    }
}

/// Read the reverse-index document for a page, if indexed.
pub async fn fetch_page(
    store: &dyn KeyValueStore,
    page_id: &str,
) -> IndexResult<Option<IndexDocument>> {
    match store.get(page_id).await? {
        Some(value) => value.into_page(page_id).map(Some),
        None => Ok(None),
    }
}

/// Read the reverse-index document for a page that must already be indexed.
pub async fn fetch_existing_page(
    store: &dyn KeyValueStore,
    page_id: &str,
) -> IndexResult<IndexDocument> {
    fetch_page(store, page_id)
        .await?
        .ok_or_else(|| IndexError::PageNotFound(page_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::Postings;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for token in ["apple", "banana", "cherry"] {
            let mut p = Postings::new();
            p.upsert("page/x.com", 5);
            store
                .put(&format!("term/{token}"), StoredValue::Postings(p))
                .await
                .unwrap();
        }
        store
    }

    fn keys(tokens: &[&str]) -> BTreeSet<String> {
        tokens.iter().map(|t| format!("term/{t}")).collect()
    }

    #[tokio::test]
    async fn test_missing_keys_are_present_as_none() {
        let store = seeded().await;
        let wanted = keys(&["apple", "durian"]);
        let result = lookup_by_keys(&store, &wanted).await.unwrap();
        assert_eq!(result.len(), 2);
        assert!(result["term/apple"].is_some());
        assert!(result["term/durian"].is_none());
    }

    #[tokio::test]
    async fn test_range_lookup_filters_to_requested() {
        let store = seeded().await;
        let wanted = keys(&["banana", "durian"]);
        let result = term_range_lookup(&store, "term/", &wanted).await.unwrap();
        assert_eq!(result.len(), 2);
        assert!(result["term/banana"].is_some());
        assert!(result["term/durian"].is_none());
        assert!(!result.contains_key("term/apple"));
    }

    #[tokio::test]
    async fn test_strategies_agree() {
        let store = seeded().await;
        let wanted = keys(&["apple", "cherry", "fig"]);
        let point = lookup_terms(&store, "term/", &wanted, 3000).await.unwrap();
        let range = lookup_terms(&store, "term/", &wanted, 0).await.unwrap();
        assert_eq!(point, range);
    }

    #[tokio::test]
    async fn test_fetch_existing_page_requires_page() {
        let store = MemoryStore::new();
        let err = fetch_existing_page(&store, "page/none.com").await.unwrap_err();
        assert!(matches!(err, IndexError::PageNotFound(_)));
    }
}
