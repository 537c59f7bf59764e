//! Raw page submissions accepted by the ingestion entry points.

use serde::{Deserialize, Serialize};

/// A page plus any visit/bookmark events observed with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSubmission {
    /// The page itself.
    pub page: PageDoc,
    /// Visits of the page.
    #[serde(default)]
    pub visits: Vec<VisitDoc>,
    /// Bookmarks of the page.
    #[serde(default)]
    pub bookmarks: Vec<BookmarkDoc>,
}

/// Page content and metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDoc {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Extracted page text.
    #[serde(default)]
    pub text: Option<String>,
    /// Meta keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A single visit event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisitDoc {
    /// Epoch millis.
    pub time: u64,
}

/// A single bookmark event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookmarkDoc {
    /// Epoch millis.
    pub time: u64,
}

impl PageSubmission {
    /// Submission for a page with no events.
    pub fn new(page: PageDoc) -> Self {
        Self {
            page,
            visits: Vec::new(),
            bookmarks: Vec::new(),
        }
    }

    /// Add a visit.
    pub fn with_visit(mut self, time: u64) -> Self {
        self.visits.push(VisitDoc { time });
        self
    }

    /// Add a bookmark.
    pub fn with_bookmark(mut self, time: u64) -> Self {
        self.bookmarks.push(BookmarkDoc { time });
        self
    }
}

impl PageDoc {
    /// Page with a URL and body text.
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
