use serde::Serialize;

use crate::model::ResultItem;

/// The displayed result. Empty strings and `None` mean "nothing shown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub name: String,
    pub date: String,
    pub content: String,
    pub url: String,
    /// 1-based position of the selected item.
    pub current: Option<usize>,
    pub count: Option<usize>,
}

impl ResultView {
    pub fn fill_from(&mut self, item: &ResultItem) {
        self.name = item.title.clone();
        self.date = item.display_date();
        self.content = item.content().unwrap_or_default().to_string();
        self.url = item.url.clone();
    }

    pub fn is_shown(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub query: String,
    pub result: ResultView,
    pub error_message: String,
}

/// Presentation callback, invoked after every state change.
pub trait Renderer: Send + Sync {
    fn render(&self, snapshot: &Snapshot);
}

/// Renderer that ignores updates; for headless use.
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&self, _snapshot: &Snapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;

    #[test]
    fn fill_copies_item_fields() {
        let mut item = ResultItem::new(
            "How do I exit Vim?".into(),
            "https://stackoverflow.com/q/1".into(),
            true,
            3,
            parse_timestamp("2012-08-06 13:57:12Z"),
        );
        let mut view = ResultView {
            current: Some(1),
            count: Some(3),
            ..Default::default()
        };
        assert!(!view.is_shown());

        view.fill_from(&item);
        assert!(view.is_shown());
        assert_eq!(view.date, "2012-08-06 13:57:12");
        assert_eq!(view.content, "");
        assert_eq!(view.current, Some(1));

        item.resolve(Some("<p>:q</p>".into()));
        view.fill_from(&item);
        assert_eq!(view.content, "<p>:q</p>");
    }

    #[test]
    fn snapshot_serializes() {
        let snap = Snapshot {
            query: "exit vim".into(),
            error_message: "Nothing found".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["query"], "exit vim");
        assert_eq!(json["error_message"], "Nothing found");
        assert!(json["result"]["current"].is_null());
    }
}
