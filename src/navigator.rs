use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::content::ContentFetcher;
use crate::fetch::PageFetcher;
use crate::model::ResultItem;
use crate::search::{is_eligible, Searcher};
use crate::view::{Renderer, ResultView, Snapshot};

/// Where the viewer is, as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Showing(usize),
    Error(String),
}

/// What happened to a submitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Too short or same as the last submitted query; nothing was done.
    Skipped,
    /// Results were committed and the first item is being shown.
    Committed,
    /// The search failed; the error message is set.
    Failed,
    /// A newer search started before this one finished; result dropped.
    Superseded,
}

#[derive(Default)]
struct State {
    query: String,
    last_submitted: Option<String>,
    /// Bumped on every search that actually goes out.
    search_seq: u64,
    /// `search_seq` of the search that produced `items`.
    session_id: u64,
    items: Vec<ResultItem>,
    current: Option<usize>,
    loading: bool,
    result: ResultView,
    error_message: String,
}

impl State {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            query: self.query.clone(),
            result: self.result.clone(),
            error_message: self.error_message.clone(),
        }
    }

    fn clear_results(&mut self) {
        self.items.clear();
        self.current = None;
        self.result = ResultView::default();
    }
}

struct Inner<F> {
    searcher: Searcher<F>,
    content: ContentFetcher<F>,
    min_query_len: usize,
    debounce: Duration,
    renderer: Arc<dyn Renderer>,
    state: Mutex<State>,
    /// Single-slot content population timer.
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Search session plus the paginated viewer over it.
///
/// State is only touched under a short lock that is never held across a
/// fetch. Each search is tagged with a sequence number so a slow search can
/// never overwrite the results of a newer one, and content populations check
/// the session they were scheduled for before writing.
pub struct Navigator<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for Navigator<F> {
    fn clone(&self) -> Self {
        Navigator {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: PageFetcher + 'static> Navigator<F> {
    pub fn new(fetcher: Arc<F>, settings: &Settings, renderer: Arc<dyn Renderer>) -> Self {
        Navigator {
            inner: Arc::new(Inner {
                searcher: Searcher::new(Arc::clone(&fetcher), &settings.origin),
                content: ContentFetcher::new(fetcher),
                min_query_len: settings.min_query_len,
                debounce: settings.debounce(),
                renderer,
                state: Mutex::new(State::default()),
                pending: Mutex::new(None),
            }),
        }
    }

    // ── Presentation events ──

    pub async fn on_query_submit(&self, text: &str) -> SubmitOutcome {
        self.submit_query(text).await
    }

    /// Accepting a browser autocomplete suggestion searches right away.
    pub async fn on_input_autocomplete_accept(&self, text: &str) -> SubmitOutcome {
        self.submit_query(text).await
    }

    pub fn on_previous_click(&self) {
        self.show_previous();
    }

    pub fn on_next_click(&self) {
        self.show_next();
    }

    // ── Transitions ──

    pub async fn submit_query(&self, query: &str) -> SubmitOutcome {
        let seq = {
            let mut st = self.inner.state.lock();
            if !is_eligible(query, st.last_submitted.as_deref(), self.inner.min_query_len) {
                debug!(query, "Query skipped");
                return SubmitOutcome::Skipped;
            }
            st.query = query.to_string();
            st.last_submitted = Some(query.to_string());
            st.search_seq += 1;
            st.loading = true;
            st.error_message.clear();
            st.search_seq
        };
        self.render();

        let outcome = self.inner.searcher.search(query).await;

        let mut st = self.inner.state.lock();
        if st.search_seq != seq {
            debug!(query, seq, latest = st.search_seq, "Dropping superseded search");
            return SubmitOutcome::Superseded;
        }
        st.loading = false;

        match outcome {
            Ok(items) => {
                info!(query, count = items.len(), "Search committed");
                st.session_id = seq;
                st.result = ResultView {
                    count: Some(items.len()),
                    ..Default::default()
                };
                st.items = items;
                drop(st);
                self.show_item(0, false);
                SubmitOutcome::Committed
            }
            Err(e) => {
                warn!(query, error = %e, "Search failed");
                st.clear_results();
                st.error_message = e.to_string();
                st.last_submitted = None;
                drop(st);
                self.cancel_pending();
                self.render();
                SubmitOutcome::Failed
            }
        }
    }

    /// Select `index` now and load its answer after the debounce delay
    /// (immediately when not debounced). A newer call replaces a pending one.
    pub fn show_item(&self, index: usize, debounced: bool) {
        let session_id = {
            let mut st = self.inner.state.lock();
            if index >= st.items.len() {
                return;
            }
            st.current = Some(index);
            st.result.current = Some(index + 1);
            st.session_id
        };
        self.render();

        let delay = if debounced {
            self.inner.debounce
        } else {
            Duration::ZERO
        };
        let nav = self.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            nav.populate(session_id, index).await;
        });

        if let Some(previous) = self.inner.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn show_previous(&self) {
        let target = match self.inner.state.lock().current {
            Some(i) if i > 0 => i - 1,
            _ => return,
        };
        self.show_item(target, true);
    }

    pub fn show_next(&self) {
        let target = {
            let st = self.inner.state.lock();
            match st.current {
                Some(i) if i + 1 < st.items.len() => i + 1,
                _ => return,
            }
        };
        self.show_item(target, true);
    }

    /// Wait for the scheduled content population, if any.
    pub async fn settle(&self) {
        let handle = self.inner.pending.lock().take();
        if let Some(handle) = handle {
            match handle.await {
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                // Cancelled means a newer population replaced it.
                _ => {}
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.inner
            .pending
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn phase(&self) -> Phase {
        let st = self.inner.state.lock();
        if st.loading {
            Phase::Loading
        } else if !st.error_message.is_empty() {
            Phase::Error(st.error_message.clone())
        } else if let Some(i) = st.current {
            Phase::Showing(i)
        } else {
            Phase::Idle
        }
    }

    /// Items of the current session.
    pub fn items(&self) -> Vec<ResultItem> {
        self.inner.state.lock().items.clone()
    }

    // ── Internals ──

    async fn populate(&self, session_id: u64, index: usize) {
        let pending = {
            let st = self.inner.state.lock();
            if st.session_id != session_id {
                return;
            }
            match st.items.get(index) {
                Some(item) if !item.is_resolved() => Some(item.clone()),
                Some(_) => None,
                None => return,
            }
        };

        // Fetch on a copy so the state lock is not held across the request.
        if let Some(mut item) = pending {
            match self.inner.content.ensure_content(&mut item).await {
                Ok(()) => {
                    let mut st = self.inner.state.lock();
                    if st.session_id != session_id {
                        return;
                    }
                    if let Some(slot) = st.items.get_mut(index) {
                        slot.resolve(item.content().map(str::to_string));
                    }
                }
                // The session survives; a later visit retries.
                Err(e) => warn!(url = %item.url, error = %e, "Failed to load answer"),
            }
        }

        {
            let mut guard = self.inner.state.lock();
            let st = &mut *guard;
            if st.session_id != session_id {
                return;
            }
            match st.items.get(index) {
                Some(item) => st.result.fill_from(item),
                None => return,
            }
        }
        self.render();
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.inner.pending.lock().take() {
            handle.abort();
        }
    }

    fn render(&self) {
        let snapshot = self.snapshot();
        self.inner.renderer.render(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;
    use crate::view::NoopRenderer;

    const ORIGIN: &str = "https://stackoverflow.com";
    const TOO_COMMON: &str = "Too common search query, try to type in more specific one";

    fn search_url(query: &str) -> String {
        format!("{}/search?q={}", ORIGIN, urlencoding::encode(query))
    }

    fn item_url(n: usize) -> String {
        format!("{}/questions/{}/q{}", ORIGIN, n, n)
    }

    /// Search page with one answered entry per title.
    fn results_page(titles: &[&str], first_id: usize) -> String {
        let entries: String = titles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let n = first_id + i;
                format!(
                    r#"<div class="search-result"><div class="result-link"><a href="/questions/{n}/q{n}" title="{t}">A: {t}</a></div></div>"#
                )
            })
            .collect();
        format!(r#"<html><body><div class="search-results">{entries}</div></body></html>"#)
    }

    fn answer_page(text: &str) -> String {
        format!(
            r#"<html><body><div id="answers"><div class="answer"><div class="answercell"><div class="post-text"><p>{text}</p></div></div></div></div></body></html>"#
        )
    }

    /// "exit vim please" → three answered results, each with an answer page.
    fn vim_site() -> MockFetcher {
        MockFetcher::new()
            .page(
                &search_url("exit vim please"),
                &results_page(&["first", "second", "third"], 1),
            )
            .page(&item_url(1), &answer_page("one"))
            .page(&item_url(2), &answer_page("two"))
            .page(&item_url(3), &answer_page("three"))
    }

    fn navigator(mock: MockFetcher) -> (Arc<MockFetcher>, Navigator<MockFetcher>) {
        let mock = Arc::new(mock);
        let nav = Navigator::new(mock.clone(), &Settings::default(), Arc::new(NoopRenderer));
        (mock, nav)
    }

    struct Recorder(Mutex<Vec<Snapshot>>);

    impl Renderer for Recorder {
        fn render(&self, snapshot: &Snapshot) {
            self.0.lock().push(snapshot.clone());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_does_nothing() {
        let (mock, nav) = navigator(vim_site());
        assert_eq!(nav.submit_query("vim").await, SubmitOutcome::Skipped);
        assert_eq!(nav.submit_query("exitv").await, SubmitOutcome::Skipped);
        assert!(mock.calls().is_empty());
        assert_eq!(nav.snapshot(), Snapshot::default());
        assert_eq!(nav.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn search_shows_first_item() {
        let (mock, nav) = navigator(vim_site());
        assert_eq!(nav.submit_query("exit vim please").await, SubmitOutcome::Committed);
        nav.settle().await;

        let snap = nav.snapshot();
        assert_eq!(snap.query, "exit vim please");
        assert_eq!(snap.result.name, "first");
        assert_eq!(snap.result.content, "<p>one</p>");
        assert_eq!(snap.result.url, item_url(1));
        assert_eq!(snap.result.current, Some(1));
        assert_eq!(snap.result.count, Some(3));
        assert_eq!(snap.error_message, "");
        assert_eq!(nav.phase(), Phase::Showing(0));
        assert_eq!(mock.calls(), [search_url("exit vim please"), item_url(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_query_is_skipped() {
        let (mock, nav) = navigator(vim_site());
        nav.submit_query("exit vim please").await;
        nav.settle().await;
        assert_eq!(nav.submit_query("exit vim please").await, SubmitOutcome::Skipped);
        assert_eq!(mock.call_count(&search_url("exit vim please")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_sets_error_and_allows_retry() {
        let query = "javascript";
        let (mock, nav) = navigator(MockFetcher::new().redirect(
            &search_url(query),
            "https://stackoverflow.com/questions/tagged/javascript",
            "<html><body></body></html>",
        ));

        assert_eq!(nav.submit_query(query).await, SubmitOutcome::Failed);
        let snap = nav.snapshot();
        assert_eq!(snap.error_message, TOO_COMMON);
        assert!(!snap.result.is_shown());
        assert!(nav.items().is_empty());
        assert_eq!(nav.phase(), Phase::Error(TOO_COMMON.to_string()));

        // the failed query was forgotten, so it may be sent again
        assert_eq!(nav.submit_query(query).await, SubmitOutcome::Failed);
        assert_eq!(mock.call_count(&search_url(query)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_answered() {
        let page = r#"<html><body><div class="search-results">
            <div class="search-result">
                <div class="stats"><div class="status unanswered">0</div></div>
                <div class="result-link"><a href="/questions/9/q9" title="nobody knows">Q: nobody knows</a></div>
            </div></div></body></html>"#;
        let (_, nav) = navigator(MockFetcher::new().page(&search_url("nobody knows"), page));

        assert_eq!(nav.submit_query("nobody knows").await, SubmitOutcome::Failed);
        assert_eq!(nav.snapshot().error_message, "Nothing found");
        assert!(nav.items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn error_is_cleared_by_next_success() {
        let mock = vim_site().redirect(
            &search_url("javascript"),
            "https://stackoverflow.com/questions/tagged/javascript",
            "",
        );
        let (_, nav) = navigator(mock);
        nav.submit_query("javascript").await;
        assert_eq!(nav.submit_query("exit vim please").await, SubmitOutcome::Committed);
        nav.settle().await;
        assert_eq!(nav.snapshot().error_message, "");
        assert_eq!(nav.phase(), Phase::Showing(0));
    }

    #[tokio::test(start_paused = true)]
    async fn edges_are_no_ops() {
        let (_, nav) = navigator(vim_site());
        nav.submit_query("exit vim please").await;
        nav.settle().await;

        nav.show_previous();
        assert_eq!(nav.snapshot().result.current, Some(1));
        assert!(!nav.has_pending());

        nav.show_item(2, false);
        nav.settle().await;
        nav.show_next();
        assert_eq!(nav.snapshot().result.current, Some(3));
        assert_eq!(nav.phase(), Phase::Showing(2));
        assert!(!nav.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_before_search_is_ignored() {
        let (mock, nav) = navigator(vim_site());
        nav.on_next_click();
        nav.on_previous_click();
        nav.show_item(0, false);
        assert!(!nav.has_pending());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn position_updates_before_content() {
        let (_, nav) = navigator(vim_site());
        nav.submit_query("exit vim please").await;
        nav.settle().await;

        nav.on_next_click();
        let snap = nav.snapshot();
        assert_eq!(snap.result.current, Some(2));
        assert_eq!(snap.result.name, "first");
        assert!(nav.has_pending());

        nav.settle().await;
        let snap = nav.snapshot();
        assert_eq!(snap.result.name, "second");
        assert_eq!(snap.result.content, "<p>two</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_keeps_only_the_last_request() {
        let (mock, nav) = navigator(vim_site());
        nav.submit_query("exit vim please").await;
        nav.settle().await;

        nav.show_item(1, true);
        tokio::time::advance(Duration::from_millis(200)).await;
        nav.show_item(2, true);
        nav.settle().await;

        assert_eq!(mock.call_count(&item_url(2)), 0);
        assert_eq!(mock.call_count(&item_url(3)), 1);
        assert_eq!(nav.snapshot().result.name, "third");
    }

    #[tokio::test(start_paused = true)]
    async fn revisit_uses_memoized_content() {
        let (mock, nav) = navigator(vim_site());
        nav.submit_query("exit vim please").await;
        nav.settle().await;

        nav.show_next();
        nav.settle().await;
        nav.show_previous();
        nav.settle().await;

        assert_eq!(nav.snapshot().result.content, "<p>one</p>");
        assert_eq!(mock.call_count(&item_url(1)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_answer_keeps_session() {
        let mock = MockFetcher::new().page(
            &search_url("broken answers"),
            &results_page(&["first", "second"], 1),
        );
        let (mock, nav) = navigator(mock);
        assert_eq!(nav.submit_query("broken answers").await, SubmitOutcome::Committed);
        nav.settle().await;

        let snap = nav.snapshot();
        assert_eq!(snap.result.name, "first");
        assert_eq!(snap.result.content, "");
        assert_eq!(snap.error_message, "");
        assert_eq!(nav.items().len(), 2);

        // still pending, so a revisit tries again
        nav.show_next();
        nav.settle().await;
        nav.show_previous();
        nav.settle().await;
        assert_eq!(mock.call_count(&item_url(1)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_search_cannot_overwrite_newer_one() {
        let mock = MockFetcher::new()
            .slow_page(
                &search_url("slow query"),
                &results_page(&["stale"], 50),
                Duration::from_secs(2),
            )
            .page(&search_url("fast query"), &results_page(&["fresh"], 1))
            .page(&item_url(1), &answer_page("fresh answer"));
        let (_, nav) = navigator(mock);

        let (slow, fast) = tokio::join!(
            nav.submit_query("slow query"),
            nav.submit_query("fast query")
        );
        nav.settle().await;

        assert_eq!(slow, SubmitOutcome::Superseded);
        assert_eq!(fast, SubmitOutcome::Committed);
        let snap = nav.snapshot();
        assert_eq!(snap.query, "fast query");
        assert_eq!(snap.result.name, "fresh");
        assert_eq!(nav.items()[0].title, "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn renderer_sees_every_change() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let nav = Navigator::new(Arc::new(vim_site()), &Settings::default(), recorder.clone());

        nav.on_query_submit("exit vim please").await;
        nav.settle().await;

        let seen = recorder.0.lock().clone();
        // loading, position set, content shown
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].query, "exit vim please");
        assert!(!seen[0].result.is_shown());
        assert_eq!(seen[1].result.current, Some(1));
        assert_eq!(seen.last(), Some(&nav.snapshot()));
    }

    #[tokio::test(start_paused = true)]
    async fn page_without_answer_is_fetched_once() {
        let mock = MockFetcher::new()
            .page(
                &search_url("unanswerable thing"),
                &results_page(&["first", "second"], 1),
            )
            .page(&item_url(1), "<html><body><div id=\"answers\"></div></body></html>")
            .page(&item_url(2), &answer_page("two"));
        let (mock, nav) = navigator(mock);
        nav.submit_query("unanswerable thing").await;
        nav.settle().await;

        nav.show_next();
        nav.settle().await;
        nav.show_previous();
        nav.settle().await;

        let snap = nav.snapshot();
        assert_eq!(snap.result.name, "first");
        assert_eq!(snap.result.content, "");
        assert_eq!(mock.call_count(&item_url(1)), 1);
        assert!(nav.items()[0].is_resolved());
        assert_eq!(nav.items()[1].content(), Some("<p>two</p>"));
    }

    struct PanicsOnContent;

    impl Renderer for PanicsOnContent {
        fn render(&self, snapshot: &Snapshot) {
            if !snapshot.result.content.is_empty() {
                panic!("render failed");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "render failed")]
    async fn settle_surfaces_population_panic() {
        let nav = Navigator::new(
            Arc::new(vim_site()),
            &Settings::default(),
            Arc::new(PanicsOnContent),
        );
        nav.submit_query("exit vim please").await;
        nav.settle().await;
    }
}
