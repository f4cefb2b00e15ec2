//! Search a Q&A site's HTML results page, scrape the answered results and
//! page through their top answers.
//!
//! [`navigator::Navigator`] is the entry point: it takes presentation events,
//! drives [`search::Searcher`] and [`content::ContentFetcher`] over a
//! [`fetch::PageFetcher`], and reports every state change to a
//! [`view::Renderer`].

pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod model;
pub mod navigator;
pub mod parser;
pub mod search;
pub mod view;

pub use config::Settings;
pub use error::{FetchError, SearchError};
pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use model::{ContentState, ResultItem};
pub use navigator::{Navigator, Phase, SubmitOutcome};
pub use view::{Renderer, ResultView, Snapshot};
