use std::sync::Arc;

use tracing::{debug, info};

use crate::error::SearchError;
use crate::fetch::PageFetcher;
use crate::model::ResultItem;
use crate::parser::{extract_body, parse_results};

/// Whether a submitted query should trigger a search at all.
///
/// The query must be strictly longer than `min_len` characters and differ
/// from the last submitted one.
pub fn is_eligible(query: &str, last_submitted: Option<&str>, min_len: usize) -> bool {
    query.chars().count() > min_len && last_submitted != Some(query)
}

/// Runs a query against the site's HTML search page.
pub struct Searcher<F> {
    fetcher: Arc<F>,
    origin: String,
}

impl<F: PageFetcher> Searcher<F> {
    pub fn new(fetcher: Arc<F>, origin: &str) -> Self {
        Searcher {
            fetcher,
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Every byte outside `A-Za-z0-9-_.~` is escaped, so the URL comes back
    /// from the HTTP client's parser unchanged and the redirect check holds.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}/search?q={}", self.origin, urlencoding::encode(query))
    }

    /// Answered results for `query`, in the site's order.
    pub async fn search(&self, query: &str) -> Result<Vec<ResultItem>, SearchError> {
        let url = self.search_url(query);
        let page = self.fetcher.get(&url).await?;

        // The site redirects a query that names one tag or question straight
        // to it instead of listing results.
        if page.final_url != url {
            debug!(requested = %url, landed = %page.final_url, "Search redirected");
            return Err(SearchError::AmbiguousQuery);
        }

        let parsed = parse_results(&extract_body(&page.body), &self.origin);
        let total = parsed.len();
        let answered: Vec<ResultItem> = parsed.into_iter().filter(|i| i.answered).collect();

        if answered.is_empty() {
            return Err(SearchError::EmptyResult);
        }

        info!(query, total, answered = answered.len(), "Search results parsed");
        Ok(answered)
    }
}
