use std::sync::LazyLock;

use scraper::Selector;

use super::body::Fragment;

static ANSWER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#answers .answer").unwrap());
// Older pages use .post-text, current ones .s-prose.
static POST_TEXT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".answercell .post-text").unwrap());
static PROSE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".answercell .s-prose").unwrap());

/// Inner markup of the first answer's body, if the page has an answer.
pub fn first_answer_html(fragment: &Fragment) -> Option<String> {
    let answer = fragment.select_first(&ANSWER_SEL)?;
    let text = answer
        .select(&POST_TEXT_SEL)
        .next()
        .or_else(|| answer.select(&PROSE_SEL).next())?;
    Some(text.inner_html().trim().to_string())
}
