use std::sync::Arc;

use tracing::debug;

use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::model::ResultItem;
use crate::parser::{extract_body, first_answer_html};

/// Lazily fills a result's answer body from its question page.
pub struct ContentFetcher<F> {
    fetcher: Arc<F>,
}

impl<F: PageFetcher> ContentFetcher<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        ContentFetcher { fetcher }
    }

    /// Fetch the item's answer unless it was already fetched.
    ///
    /// A page without an answer leaves the item resolved with no content; it
    /// is not fetched again. On error the item stays pending.
    pub async fn ensure_content(&self, item: &mut ResultItem) -> Result<(), FetchError> {
        if item.is_resolved() {
            return Ok(());
        }
        let answer = self.fetch_answer(&item.url).await?;
        item.resolve(answer);
        Ok(())
    }

    /// GET a question page and pull out the first answer's markup.
    pub async fn fetch_answer(&self, url: &str) -> Result<Option<String>, FetchError> {
        let page = self.fetcher.get(url).await?;
        let answer = first_answer_html(&extract_body(&page.body));
        if answer.is_none() {
            debug!(url, "No answer body on page");
        }
        Ok(answer)
    }
}
