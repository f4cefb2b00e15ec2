use thiserror::Error;

/// Failure of a single outbound GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// User-visible search failures. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The site redirected away from the search page, usually because the
    /// query matched a single tag or question.
    #[error("Too common search query, try to type in more specific one")]
    AmbiguousQuery,

    #[error("Nothing found")]
    EmptyResult,

    #[error("Search failed, check your connection and try again")]
    Network(#[from] FetchError),
}
