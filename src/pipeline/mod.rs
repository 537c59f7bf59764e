//! Derivation pipeline — turns a raw page submission into an index document.

pub mod submission;
pub mod tokenize;

use async_trait::async_trait;
use url::Url;

use crate::config::TokenizerConfig;
use crate::types::{
    bookmark_key, visit_key, IndexDocument, IndexError, IndexResult, PAGE_KEY_PREFIX,
};

pub use submission::{BookmarkDoc, PageDoc, PageSubmission, VisitDoc};
pub use tokenize::Tokenizer;

/// Produces index documents from raw submissions.
#[async_trait]
pub trait DocumentDeriver: Send + Sync {
    /// Derive the index document for a submission.
    async fn derive(&self, req: PageSubmission) -> IndexResult<IndexDocument>;
}

/// Default derivation: URL normalization plus tokenized body, title and URL terms.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    tokenizer: Tokenizer,
}

impl Pipeline {
    /// Create a pipeline with the given tokenizer settings.
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config),
        }
    }

    /// Synchronous derivation used by the async trait impl.
    pub fn derive_document(&self, req: &PageSubmission) -> IndexResult<IndexDocument> {
        let url = parse_url(&req.page.url)?;
        let host = url
            .host_str()
            .ok_or_else(|| IndexError::Derivation(format!("URL has no host: {}", req.page.url)))?;
        let domain = strip_www(host).to_string();

        let mut doc = IndexDocument::new(page_id(&domain, &url), domain);

        let mut body = req.page.text.clone().unwrap_or_default();
        for keyword in &req.page.keywords {
            body.push(' ');
            body.push_str(keyword);
        }
        doc.terms = self.tokenizer.tokenize(&body);
        doc.title_terms = self
            .tokenizer
            .tokenize(req.page.title.as_deref().unwrap_or_default());
        doc.url_terms = self.tokenizer.tokenize_url(host, url.path());

        doc.visits = req.visits.iter().map(|v| visit_key(v.time)).collect();
        doc.bookmarks = req.bookmarks.iter().map(|b| bookmark_key(b.time)).collect();
        doc.latest = req
            .visits
            .iter()
            .map(|v| v.time)
            .chain(req.bookmarks.iter().map(|b| b.time))
            .max()
            .unwrap_or(0);

        Ok(doc)
    }
}

#[async_trait]
impl DocumentDeriver for Pipeline {
    async fn derive(&self, req: PageSubmission) -> IndexResult<IndexDocument> {
        self.derive_document(&req)
    }
}

/// Normalized page id for a URL: scheme, `www.`, fragment and trailing `/` removed.
pub fn normalize_page_id(raw_url: &str) -> IndexResult<String> {
    let url = parse_url(raw_url)?;
    let host = url
        .host_str()
        .ok_or_else(|| IndexError::Derivation(format!("URL has no host: {raw_url}")))?;
    Ok(page_id(strip_www(host), &url))
}

fn parse_url(raw: &str) -> IndexResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(IndexError::Derivation("empty URL".to_string()));
    }
    let parsed = match Url::parse(raw) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}")),
        other => other,
    };
    parsed.map_err(|e| IndexError::Derivation(format!("invalid URL {raw}: {e}")))
}

fn page_id(domain: &str, url: &Url) -> String {
    let mut id = format!("{PAGE_KEY_PREFIX}{domain}{}", url.path());
    while id.ends_with('/') {
        id.pop();
    }
    if let Some(query) = url.query() {
        id.push('?');
        id.push_str(query);
    }
    id
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
