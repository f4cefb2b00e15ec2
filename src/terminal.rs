use std::io::Write;
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;
use stackpeek::view::{Renderer, Snapshot};

static BLANKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Prints the viewer as text. The full item is printed only when the shown
/// item or the error changes; position moves print a one-line indicator.
pub struct TerminalRenderer {
    inner: Mutex<Sink>,
}

struct Sink {
    out: Box<dyn Write + Send>,
    last: Printed,
}

#[derive(Default, PartialEq)]
struct Printed {
    position: Option<usize>,
    url: String,
    content: String,
    error: String,
}

impl TerminalRenderer {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        TerminalRenderer {
            inner: Mutex::new(Sink {
                out: Box::new(out),
                last: Printed::default(),
            }),
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(std::io::stdout())
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, snapshot: &Snapshot) {
        let mut guard = self.inner.lock();
        let sink = &mut *guard;
        let result = &snapshot.result;

        // Write errors are ignored.
        if !snapshot.error_message.is_empty() {
            if sink.last.error != snapshot.error_message {
                let _ = writeln!(sink.out, "! {}", snapshot.error_message);
            }
            sink.last = Printed {
                error: snapshot.error_message.clone(),
                ..Default::default()
            };
            let _ = sink.out.flush();
            return;
        }

        let changed = sink.last.url != result.url || sink.last.content != result.content;
        if result.is_shown() && changed {
            let _ = writeln!(sink.out, "{}", render_item(snapshot));
        } else if result.current.is_some() && sink.last.position != result.current {
            let _ = writeln!(sink.out, "{} ...", position(snapshot));
        }
        let _ = sink.out.flush();

        sink.last = Printed {
            position: result.current,
            url: result.url.clone(),
            content: result.content.clone(),
            error: String::new(),
        };
    }
}

fn position(snapshot: &Snapshot) -> String {
    match (snapshot.result.current, snapshot.result.count) {
        (Some(current), Some(count)) => format!("[{}/{}]", current, count),
        _ => String::new(),
    }
}

/// Full text block for the displayed result.
pub fn render_item(snapshot: &Snapshot) -> String {
    let result = &snapshot.result;
    let mut out = format!("\n{} {}\n", position(snapshot), result.name);
    if !result.date.is_empty() {
        out.push_str(&format!("{}\n", result.date));
    }
    out.push_str(&format!("{}\n\n", result.url));

    if result.content.is_empty() {
        out.push_str("(no answer text available)\n");
    } else {
        out.push_str(&html_to_text(&result.content));
        out.push('\n');
    }
    out
}

fn html_to_text(html: &str) -> String {
    let md = html2md::parse_html(html);
    BLANKS_RE.replace_all(md.trim(), "\n\n").to_string()
}
