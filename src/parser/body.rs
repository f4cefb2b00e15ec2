use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Reserved id of the synthesized container element.
pub const CONTAINER_ID: &str = "body-tag-element";

const BODY_OPEN: &str = "<body";
const BODY_CLOSE: &str = "</body>";
const CONTAINER_OPEN: &str = "<div id=\"body-tag-element\"";

static CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#body-tag-element").unwrap());

/// Queryable body content of a fetched page.
pub struct Fragment {
    html: Html,
}

impl Fragment {
    /// The synthesized container, or the parser's root if it went missing.
    pub fn root(&self) -> ElementRef<'_> {
        self.html
            .select(&CONTAINER_SEL)
            .next()
            .unwrap_or_else(|| self.html.root_element())
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.root().select(selector).collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.root().select(selector).next()
    }
}

/// Cut the body out of a whole page and parse it as a fragment.
///
/// The first `<body` (attributes allowed) becomes the opening of a
/// `div#body-tag-element`, so the body's own attributes survive. Content runs
/// to the first `</body>` after it, or to end of input when the page was cut
/// short. A page without `<body` is wrapped as-is. Never fails: html5ever
/// repairs whatever markup is left.
pub fn extract_body(html: &str) -> Fragment {
    let wrapped = match html.find(BODY_OPEN) {
        Some(start) => {
            let rest = &html[start + BODY_OPEN.len()..];
            let end = rest.find(BODY_CLOSE).unwrap_or(rest.len());
            format!("{}{}</div>", CONTAINER_OPEN, &rest[..end])
        }
        None => format!("{}>{}</div>", CONTAINER_OPEN, html),
    };

    Fragment {
        html: Html::parse_fragment(&wrapped),
    }
}
