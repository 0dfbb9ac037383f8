//! Guardian content API fetcher.
//!
//! Issues the search request, then turns the JSON body into [`NewsItem`]s.
//! A malformed top level fails the whole load; a malformed entry is skipped
//! and the rest of the page is kept.
//!
//! Response shape (only the fields read here):
//!
//! ```json
//! { "response": { "results": [
//!     { "webTitle": "...", "webUrl": "https://...",
//!       "webPublicationDate": "2021-03-03T10:00:00Z",
//!       "sectionName": "World news",
//!       "tags": [ { "webTitle": "Jane Doe" } ] }
//! ] } }
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::{ErrorKind, LoadOutcome, NewsItem};

/// Executes a built request and parses the response.
///
/// Called on a background thread by the loader, so implementations must be
/// [`Send`] + [`Sync`].  Failures are reported through the returned
/// [`LoadOutcome`], never by panicking.
pub trait NewsFetcher: Send + Sync {
    fn fetch(&self, request: &Url) -> LoadOutcome;
}

/// Everything that can go wrong before the entries are looked at.
#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
    #[error("body is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FetchError> for ErrorKind {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(_) | FetchError::Status(_) => ErrorKind::NetworkFailure,
            FetchError::Json(_) => ErrorKind::ParseFailure,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope {
    response: ResponseBody,
}

/// Entries stay untyped here so one bad entry cannot fail the whole page.
#[derive(Deserialize)]
struct ResponseBody {
    results: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    web_title: String,
    web_url: String,
    web_publication_date: String,
    #[serde(default)]
    section_name: Option<String>,
    #[serde(default)]
    tags: Option<Vec<RawTag>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTag {
    #[serde(default)]
    web_title: Option<String>,
}

impl RawEntry {
    fn into_item(self) -> Option<NewsItem> {
        let author = self
            .tags
            .and_then(|tags| tags.into_iter().next())
            .and_then(|tag| tag.web_title)
            .unwrap_or_default();

        NewsItem::new(
            self.web_title,
            author,
            self.web_publication_date,
            self.section_name.unwrap_or_default(),
            self.web_url,
        )
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Blocking HTTP fetcher for the Guardian search endpoint.
pub struct GuardianFetcher {
    client: Client,
}

impl GuardianFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn get_body(&self, request: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(request.clone()).send()?;

        let status = response.status();
        debug!(path = request.path(), %status, "search response received");
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.bytes()?.to_vec())
    }
}

impl NewsFetcher for GuardianFetcher {
    fn fetch(&self, request: &Url) -> LoadOutcome {
        match self.get_body(request) {
            Ok(body) => parse_response(&body),
            Err(e) => {
                warn!(error = %e, "news request failed");
                LoadOutcome::Failure(e.into())
            }
        }
    }
}

/// Parse a search response body.
///
/// Pure (no I/O) so the parsing rules can be tested without a server.
pub fn parse_response(body: &[u8]) -> LoadOutcome {
    match parse_items(body) {
        Ok(items) => LoadOutcome::from_items(items),
        Err(e) => {
            warn!(error = %e, "news response could not be parsed");
            LoadOutcome::Failure(e.into())
        }
    }
}

fn parse_items(body: &[u8]) -> Result<Vec<NewsItem>, FetchError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    let total = envelope.response.results.len();

    let items: Vec<NewsItem> = envelope
        .response
        .results
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<RawEntry>(value) {
            Ok(entry) => {
                let item = entry.into_item();
                if item.is_none() {
                    debug!(index, "skipping entry without a title or absolute url");
                }
                item
            }
            Err(e) => {
                debug!(index, error = %e, "skipping malformed entry");
                None
            }
        })
        .collect();

    info!(total, kept = items.len(), "parsed search results");
    Ok(items)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
