//! Posting maintenance — the term, URL-term, title-term and domain indexes.

use std::collections::BTreeSet;

use crate::types::{IndexDocument, Postings, TERM_KEY_PREFIX, TITLE_KEY_PREFIX, URL_KEY_PREFIX};

/// Set or replace the entry for `doc` inside an existing posting.
pub fn reduce_term_value(current: Option<Postings>, doc: &IndexDocument) -> Postings {
    let mut postings = current.unwrap_or_default();
    postings.upsert(doc.id.clone(), doc.latest);
    postings
}

/// Which term set of a document a term index is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermField {
    /// Body terms, keyed `term/<token>`.
    Body,
    /// URL terms, keyed `url/<token>`.
    Url,
    /// Title terms, keyed `title/<token>`.
    Title,
}

impl TermField {
    /// Key prefix shared by every posting of this field.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Body => TERM_KEY_PREFIX,
            Self::Url => URL_KEY_PREFIX,
            Self::Title => TITLE_KEY_PREFIX,
        }
    }

    /// Store key for a token.
    pub fn key(&self, token: &str) -> String {
        format!("{}{}", self.prefix(), token)
    }

    /// The document's tokens for this field.
    pub fn tokens<'a>(&self, doc: &'a IndexDocument) -> &'a BTreeSet<String> {
        match self {
            Self::Body => &doc.terms,
            Self::Url => &doc.url_terms,
            Self::Title => &doc.title_terms,
        }
    }

    /// Store keys for every token of this field in `doc`.
    pub fn keys(&self, doc: &IndexDocument) -> BTreeSet<String> {
        self.tokens(doc).iter().map(|t| self.key(t)).collect()
    }

    /// Return a human-readable name for this field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Body => "terms",
            Self::Url => "url terms",
            Self::Title => "title terms",
        }
    }
}

impl std::fmt::Display for TermField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
