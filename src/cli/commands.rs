//! CLI command implementations.
//!
//! Every command loads the snapshot into a [`MemoryStore`], runs against a
//! [`PageIndex`] over it, and writes the snapshot back when it changed.

use std::path::Path;
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::engine::{IndexOutcome, PageIndex};
use crate::format::{SnapshotReader, SnapshotWriter};
use crate::pipeline::{normalize_page_id, PageSubmission};
use crate::store::MemoryStore;
use crate::types::{
    timestamp_of_key, IndexError, IndexResult, StoredValue, BOOKMARK_KEY_PREFIX, PAGE_KEY_PREFIX,
    TERM_KEY_PREFIX, TITLE_KEY_PREFIX, URL_KEY_PREFIX, VISIT_KEY_PREFIX,
};

type Meta = serde_json::Map<String, serde_json::Value>;

/// Create a new empty snapshot.
pub fn cmd_create(path: &Path) -> IndexResult<()> {
    SnapshotWriter::write_to_file(&[], path)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Display entry counts for a snapshot.
pub fn cmd_info(path: &Path, json: bool) -> IndexResult<()> {
    let header = SnapshotReader::read_header(path)?;
    let entries = SnapshotReader::read_from_file(path)?;
    let file_size = std::fs::metadata(path)?.len();
    let stats = SnapshotStats::collect(&entries);

    if json {
        let info = serde_json::json!({
            "file": path.display().to_string(),
            "version": header.version,
            "entries": header.entry_count,
            "file_size": file_size,
            "pages": stats.pages,
            "domains": stats.domains,
            "terms": stats.terms,
            "url_terms": stats.url_terms,
            "title_terms": stats.title_terms,
            "visits": stats.visits,
            "bookmarks": stats.bookmarks,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&info).unwrap_or_default()
        );
    } else {
        println!("File: {}", path.display());
        println!("Version: {}", header.version);
        println!("Entries: {}", header.entry_count);
        println!("File size: {}", format_size(file_size));
        println!("Pages: {}", stats.pages);
        println!("Domains: {}", stats.domains);
        println!("Postings:");
        println!("  Terms: {}", stats.terms);
        println!("  URL terms: {}", stats.url_terms);
        println!("  Title terms: {}", stats.title_terms);
        println!("Visits: {}", stats.visits);
        println!("Bookmarks: {}", stats.bookmarks);
    }
    Ok(())
}

/// Index one page submission (JSON file) through the write queue.
pub async fn cmd_add(
    path: &Path,
    submission_path: &Path,
    config: &IndexConfig,
    json: bool,
) -> IndexResult<()> {
    let req: PageSubmission = serde_json::from_str(&std::fs::read_to_string(submission_path)?)?;
    let (store, index) = open_index(path, config)?;

    let outcome = index.add_page_concurrent(req).await?;
    if !outcome.is_skipped() {
        save(&store, path).await?;
    }
    print_outcome(&outcome, json);
    Ok(())
}

/// Bulk-index a JSON-lines file of submissions in a single unqueued pass.
pub async fn cmd_import(
    path: &Path,
    jsonl_path: &Path,
    config: &IndexConfig,
    json: bool,
) -> IndexResult<()> {
    let data = std::fs::read_to_string(jsonl_path)?;
    let (store, index) = open_index(path, config)?;

    let mut indexed = 0usize;
    let mut partial = 0usize;
    let mut skipped = 0usize;
    let mut rejected = 0usize;

    for (line_no, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let req: PageSubmission = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                log::warn!("line {}: {}", line_no + 1, e);
                rejected += 1;
                continue;
            }
        };
        match index.add_page(req).await {
            Ok(IndexOutcome::Indexed(_)) => indexed += 1,
            Ok(IndexOutcome::Partial { .. }) => partial += 1,
            Ok(IndexOutcome::Skipped) => skipped += 1,
            Err(e @ IndexError::Derivation(_)) => {
                log::warn!("line {}: {}", line_no + 1, e);
                rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    save(&store, path).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": indexed,
                "partial": partial,
                "skipped": skipped,
                "rejected": rejected,
            })
        );
    } else {
        println!(
            "Imported {} pages ({} partial, {} skipped, {} rejected)",
            indexed, partial, skipped, rejected
        );
    }
    Ok(())
}

/// Bookmark an indexed page.
pub async fn cmd_bookmark(
    path: &Path,
    page_id: &str,
    time: Option<u64>,
    config: &IndexConfig,
    json: bool,
) -> IndexResult<()> {
    let page_id = resolve_page_id(page_id)?;
    let (store, index) = open_index(path, config)?;
    let time = time.unwrap_or_else(crate::types::now_millis);
    index.add_bookmark_concurrent(page_id.as_str(), Some(time)).await?;
    save(&store, path).await?;

    let key = crate::types::bookmark_key(time);
    if json {
        println!("{}", serde_json::json!({"page_id": page_id, "bookmark": key}));
    } else {
        println!("Bookmarked {} as {} ({})", page_id, key, format_timestamp(time));
    }
    Ok(())
}

/// Attach a visit/bookmark key with optional metadata to an indexed page.
pub async fn cmd_timestamp(
    path: &Path,
    page_id: &str,
    key: &str,
    meta: Option<&str>,
    config: &IndexConfig,
    json: bool,
) -> IndexResult<()> {
    check_timestamp_key(key)?;
    let page_id = resolve_page_id(page_id)?;
    let meta = meta.map(parse_object).transpose()?;

    let (store, index) = open_index(path, config)?;
    index
        .add_timestamp_concurrent(page_id.as_str(), key, meta)
        .await?;
    save(&store, path).await?;

    if json {
        println!("{}", serde_json::json!({"page_id": page_id, "timestamp": key}));
    } else {
        println!("Added {} to {}", key, page_id);
    }
    Ok(())
}

/// Merge a JSON object into the metadata of a timestamp entry.
pub async fn cmd_annotate(
    path: &Path,
    timestamp_id: &str,
    patch: &str,
    config: &IndexConfig,
    json: bool,
) -> IndexResult<()> {
    let patch = parse_object(patch)?;
    let (store, index) = open_index(path, config)?;

    index
        .update_timestamp_meta_concurrent(timestamp_id, move |mut entry| {
            entry.meta.extend(patch);
            entry
        })
        .await?;
    save(&store, path).await?;

    let value = index.get(timestamp_id).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_default()
        );
    } else {
        println!("Updated {}", timestamp_id);
    }
    Ok(())
}

/// Print the value stored under a key.
pub fn cmd_get(path: &Path, key: &str, json: bool) -> IndexResult<()> {
    let entries = SnapshotReader::read_from_file(path)?;
    let value = entries
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v);

    if json {
        println!(
            "{}",
            serde_json::json!({"key": key, "value": value})
        );
        return Ok(());
    }

    match value {
        None => println!("{}: (absent)", key),
        Some(value) => {
            println!("Key: {}", key);
            println!("Kind: {}", value.kind());
            if let Some(time) = timestamp_of_key(key) {
                println!("Time: {}", format_timestamp(time));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn open_index(path: &Path, config: &IndexConfig) -> IndexResult<(Arc<MemoryStore>, PageIndex)> {
    let store = Arc::new(SnapshotReader::read_store(path)?);
    let index = PageIndex::with_config(store.clone(), config);
    Ok((store, index))
}

async fn save(store: &MemoryStore, path: &Path) -> IndexResult<()> {
    SnapshotWriter::write_store(store, path).await
}

/// Accept either a page id or a URL to normalize into one.
fn resolve_page_id(raw: &str) -> IndexResult<String> {
    if raw.starts_with(PAGE_KEY_PREFIX) {
        return Ok(raw.to_string());
    }
    normalize_page_id(raw).map_err(|e| IndexError::Usage(e.to_string()))
}

fn check_timestamp_key(key: &str) -> IndexResult<()> {
    if timestamp_of_key(key).is_none() {
        return Err(IndexError::Usage(format!(
            "timestamp key must be {VISIT_KEY_PREFIX}<millis> or {BOOKMARK_KEY_PREFIX}<millis>: {key}"
        )));
    }
    Ok(())
}

fn parse_object(raw: &str) -> IndexResult<Meta> {
    match serde_json::from_str(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(IndexError::Usage(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn print_outcome(outcome: &IndexOutcome, json: bool) {
    match outcome {
        IndexOutcome::Indexed(doc) => {
            if json {
                println!("{}", serde_json::json!({"status": "indexed", "page": doc}));
            } else {
                println!(
                    "Indexed {} ({} terms, {} visits, {} bookmarks)",
                    doc.id,
                    doc.terms.len(),
                    doc.visits.len(),
                    doc.bookmarks.len()
                );
            }
        }
        IndexOutcome::Partial { document, failures } => {
            let stages: Vec<String> = failures.iter().map(|f| f.stage.to_string()).collect();
            if json {
                println!(
                    "{}",
                    serde_json::json!({"status": "partial", "page": document, "failed": stages})
                );
            } else {
                let id = document.as_ref().map(|d| d.id.as_str()).unwrap_or("(page)");
                println!("Partially indexed {}; failed: {}", id, stages.join(", "));
            }
        }
        IndexOutcome::Skipped => {
            if json {
                println!("{}", serde_json::json!({"status": "skipped"}));
            } else {
                println!("Skipped: page has no terms");
            }
        }
    }
}

/// Per-namespace entry counts.
#[derive(Debug, Default, PartialEq)]
pub struct SnapshotStats {
    pub pages: usize,
    pub domains: usize,
    pub terms: usize,
    pub url_terms: usize,
    pub title_terms: usize,
    pub visits: usize,
    pub bookmarks: usize,
}

impl SnapshotStats {
    /// Count entries by key namespace.
    pub fn collect(entries: &[(String, StoredValue)]) -> Self {
        let mut stats = Self::default();
        for (key, value) in entries {
            if key.starts_with(PAGE_KEY_PREFIX) {
                stats.pages += 1;
            } else if key.starts_with(TERM_KEY_PREFIX) {
                stats.terms += 1;
            } else if key.starts_with(URL_KEY_PREFIX) {
                stats.url_terms += 1;
            } else if key.starts_with(TITLE_KEY_PREFIX) {
                stats.title_terms += 1;
            } else if key.starts_with(VISIT_KEY_PREFIX) {
                stats.visits += 1;
            } else if key.starts_with(BOOKMARK_KEY_PREFIX) {
                stats.bookmarks += 1;
            } else if matches!(value, StoredValue::Postings(_)) && !key.contains('/') {
                stats.domains += 1;
            }
        }
        stats
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_timestamp(millis: u64) -> String {
    let dt = chrono::DateTime::from_timestamp_millis(millis as i64);
    match dt {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{} ms", millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetaTimestampEntry, Postings};

    #[test]
    fn test_stats_by_namespace() {
        let entries: Vec<(String, StoredValue)> = vec![
            ("a.com".into(), Postings::new().into()),
            ("term/x".into(), Postings::new().into()),
            ("url/x".into(), Postings::new().into()),
            ("title/x".into(), Postings::new().into()),
            ("visit/1".into(), MetaTimestampEntry::new("page/a.com").into()),
            ("bookmark/2".into(), MetaTimestampEntry::new("page/a.com").into()),
        ];
        let stats = SnapshotStats::collect(&entries);
        assert_eq!(stats.domains, 1);
        assert_eq!(stats.terms, 1);
        assert_eq!(stats.url_terms, 1);
        assert_eq!(stats.title_terms, 1);
        assert_eq!(stats.visits, 1);
        assert_eq!(stats.bookmarks, 1);
        assert_eq!(stats.pages, 0);
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object(r#"{"a": 1}"#).is_ok());
        assert!(matches!(parse_object("[1]"), Err(IndexError::Usage(_))));
    }

    #[test]
    fn test_resolve_page_id_accepts_urls() {
        assert_eq!(
            resolve_page_id("page/example.com/docs").unwrap(),
            "page/example.com/docs"
        );
        assert_eq!(
            resolve_page_id("https://www.example.com/docs/").unwrap(),
            "page/example.com/docs"
        );
        assert!(matches!(resolve_page_id("http://"), Err(IndexError::Usage(_))));
    }

    #[test]
    fn test_timestamp_key_must_carry_time() {
        assert!(check_timestamp_key("visit/1700").is_ok());
        assert!(check_timestamp_key("bookmark/42").is_ok());
        assert!(matches!(check_timestamp_key("visit/soon"), Err(IndexError::Usage(_))));
        assert!(matches!(check_timestamp_key("term/rust"), Err(IndexError::Usage(_))));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(10), "10 B");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
