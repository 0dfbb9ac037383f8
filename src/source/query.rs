//! Request construction for the Guardian content search endpoint.
//!
//! [`QueryBuilder::build`] is a pure function of its inputs: parameters are
//! always appended in the same order, so the same base and config always give
//! the same URL string.

use url::Url;

use crate::config::SearchConfig;

/// Builds fully-qualified search requests.
///
/// Holds the parts of the request that do not change between loads: the API
/// credential and the term used when the user has not typed one.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    api_key: String,
    default_term: String,
}

impl QueryBuilder {
    pub fn new(api_key: impl Into<String>, default_term: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_term: default_term.into(),
        }
    }

    /// Produce the request URL for `config`.
    ///
    /// Parameter order is `show-tags`, `api-key`, `order-by`, `q`, then the
    /// optional `section`.  `q` is never omitted: a blank term falls back to
    /// the default term.  `section` is only present when one is selected.
    pub fn build(&self, base: &Url, config: &SearchConfig) -> Url {
        let mut url = base.clone();

        let term = match config.term.trim() {
            "" => self.default_term.as_str(),
            term => term,
        };

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("show-tags", "contributor")
                .append_pair("api-key", &self.api_key)
                .append_pair("order-by", "newest")
                .append_pair("q", term);

            if !config.section.is_empty() {
                pairs.append_pair("section", &config.section);
            }
        }

        url
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
