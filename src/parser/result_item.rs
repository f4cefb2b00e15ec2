use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::body::Fragment;
use crate::model::{parse_timestamp, ResultItem};

static ENTRY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".search-results .search-result").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".result-link a").unwrap());
static BADGE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".stats .status").unwrap());
static VOTES_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".vote-count-post").unwrap());
static TIME_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".relativetime").unwrap());

const ANSWER_PREFIX: &str = "A: ";
const UNANSWERED_CLASS: &str = "unanswered";

/// Parse every search result entry on the page, in page order.
/// Entries without a usable title link are skipped.
pub fn parse_results(fragment: &Fragment, origin: &str) -> Vec<ResultItem> {
    let entries = fragment.select_all(&ENTRY_SEL);
    let total = entries.len();

    let items: Vec<ResultItem> = entries
        .into_iter()
        .filter_map(|entry| parse_result_item(entry, origin))
        .collect();

    if items.len() < total {
        debug!(
            skipped = total - items.len(),
            total, "Skipped unparseable search results"
        );
    }
    items
}

/// Extract one result. `None` when the title link is missing or unusable.
pub fn parse_result_item(entry: ElementRef<'_>, origin: &str) -> Option<ResultItem> {
    let link = entry.select(&LINK_SEL).next()?;

    let title = link.value().attr("title")?.trim();
    if title.is_empty() {
        return None;
    }
    let href = link.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let answered = link.inner_html().trim().starts_with(ANSWER_PREFIX) || has_answered_badge(entry);

    let vote_count = entry
        .select(&VOTES_SEL)
        .next()
        .and_then(|el| el.text().collect::<String>().trim().parse::<i64>().ok())
        .unwrap_or(0);

    let timestamp = entry
        .select(&TIME_SEL)
        .next()
        .and_then(|el| el.value().attr("title"))
        .and_then(parse_timestamp);

    Some(ResultItem::new(
        title.to_string(),
        absolute_url(origin, href),
        answered,
        vote_count,
        timestamp,
    ))
}

/// Exactly one status badge, and it is not the "unanswered" one.
fn has_answered_badge(entry: ElementRef<'_>) -> bool {
    let badges: Vec<_> = entry.select(&BADGE_SEL).collect();
    match badges.as_slice() {
        [badge] => !badge.value().classes().any(|c| c == UNANSWERED_CLASS),
        _ => false,
    }
}

fn absolute_url(origin: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}
