//! The domain records produced by the loading pipeline.
//!
//! `NewsItem` is a single article, `LoadOutcome` is the terminal result of one
//! load, and `ErrorKind` says why a load failed.  Everything here is a plain
//! immutable value so it can cross from the fetch thread to the UI thread
//! without any sharing.

use thiserror::Error;
use url::Url;

/// One article, normalised from the search API's result entry.
///
/// Fields are private so the two invariants hold for every value in the
/// program: the title is non-empty and the URL is absolute.  Use
/// [`NewsItem::new`] to construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    title: String,
    author: String,
    published_at: String,
    section: String,
    url: String,
}

impl NewsItem {
    /// Build an item, or `None` when it could not be opened or listed
    /// (empty title, empty or relative URL).
    ///
    /// `published_at` is kept exactly as received; formatting it for humans
    /// is done by the UI.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        published_at: impl Into<String>,
        section: impl Into<String>,
        url: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into();
        let url = url.into();

        if title.trim().is_empty() || Url::parse(&url).is_err() {
            return None;
        }

        Some(Self {
            title,
            author: author.into(),
            published_at: published_at.into(),
            section: section.into(),
            url,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Contributor display name; empty when the article is unattributed.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Raw ISO-8601 timestamp, e.g. `2021-03-03T10:00:00Z`.
    pub fn published_at(&self) -> &str {
        &self.published_at
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Why a load ended without results.
///
/// The `Display` text is what the user sees in place of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The connectivity gate said no; no request was made.
    #[error("No internet connection.")]
    NoConnection,
    /// Transport error, timeout, or non-2xx status.
    #[error("Could not reach the news service.")]
    NetworkFailure,
    /// The body was not the expected JSON document.
    #[error("Unexpected response from the news service.")]
    ParseFailure,
}

/// The terminal result of one load.  Exactly one is delivered per generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Usable items in the order the API returned them.
    Success(Vec<NewsItem>),
    /// The request succeeded but nothing usable came back.
    Empty,
    Failure(ErrorKind),
}

impl LoadOutcome {
    /// `Empty` for an empty list, `Success` otherwise.
    pub fn from_items(items: Vec<NewsItem>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Success(items)
        }
    }

    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Empty => "empty",
            Self::Failure(_) => "failure",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
