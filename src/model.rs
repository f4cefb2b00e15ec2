use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Answer body of a result item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentState {
    /// Not fetched yet.
    #[default]
    Pending,
    /// Inner markup of the first answer.
    Loaded(String),
    /// Fetched, but the question page had no answer body.
    Missing,
}

/// One entry of a search results page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub title: String,
    pub url: String,
    pub answered: bool,
    pub vote_count: i64,
    pub timestamp: Option<DateTime<Utc>>,
    content: ContentState,
}

impl ResultItem {
    pub fn new(
        title: String,
        url: String,
        answered: bool,
        vote_count: i64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        ResultItem {
            title,
            url,
            answered,
            vote_count,
            timestamp,
            content: ContentState::Pending,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.content {
            ContentState::Loaded(html) => Some(html),
            _ => None,
        }
    }

    pub fn content_state(&self) -> &ContentState {
        &self.content
    }

    /// True once a fetch has settled with or without an answer body.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.content, ContentState::Pending)
    }

    /// Records a fetch outcome. Already resolved items keep their content.
    pub fn resolve(&mut self, answer: Option<String>) {
        if self.is_resolved() {
            return;
        }
        self.content = match answer {
            Some(html) => ContentState::Loaded(html),
            None => ContentState::Missing,
        };
    }

    /// `YYYY-MM-DD HH:MM:SS` in UTC, empty when the date is unknown.
    pub fn display_date(&self) -> String {
        self.timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// Parse the `title` of a relative-time element, e.g. `2015-03-12 14:05:33Z`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    let naive = raw.trim_end_matches('Z');
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}
