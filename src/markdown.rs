//! Markdown rendering and text extraction.
//!
//! Rendering goes through `pulldown-cmark` with a small event pipeline:
//!
//! - HTML comments are dropped (they carry front matter and landing markers).
//! - Other raw HTML is escaped unless `render.allow_html` is set, in which
//!   case it is emitted verbatim without sanitizing.
//! - Code blocks are wrapped in `<div class="code-wrapper" data-lang="…">` so
//!   the client script can add copy buttons and language labels. Fenced
//!   blocks in a language `syntect` knows are highlighted with `hl-*` token
//!   classes (styled by the stylesheet); anything else stays plain text.
//! - Headings get stable `id` anchors derived from their text.
//!
//! Plain-text extraction is regex based and only feeds the search index and
//! the reading time estimate; it never touches rendered output.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Prefix on every highlighting class, e.g. `hl-keyword`.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Average reading speed used for the reading time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Markdown to HTML renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    allow_html: bool,
}

impl MarkdownRenderer {
    pub fn new(allow_html: bool) -> Self {
        Self { allow_html }
    }

    /// Render a markdown body to an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut events: Vec<Event> = Vec::new();
        let mut in_comment = false;
        // Language and collected text of the code block being read
        let mut code: Option<(String, String)> = None;

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Html(raw) | Event::InlineHtml(raw) if in_comment || is_comment(&raw) => {
                    in_comment = !closes_comment(&raw, in_comment);
                }
                Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_html => {
                    events.push(Event::Text(raw));
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buf)) = code.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match &kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c.is_whitespace() || c == ',')
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    let lang = if lang.is_empty() { "plaintext".to_string() } else { lang };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, text)) = code.take() {
                        events.push(Event::Html(CowStr::from(code_block_html(&lang, &text))));
                    }
                }
                other => events.push(other),
            }
        }

        assign_heading_ids(&mut events);

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }
}

fn is_comment(raw: &str) -> bool {
    raw.trim_start().starts_with("<!--")
}

/// Whether `raw` ends the comment that is open (or opened by `raw` itself).
fn closes_comment(raw: &str, already_open: bool) -> bool {
    let tail = if already_open {
        raw
    } else {
        raw.trim_start().trim_start_matches("<!--")
    };
    tail.contains("-->")
}

/// A complete code block: wrapper, `pre`, `code` and highlighted body.
fn code_block_html(lang: &str, text: &str) -> String {
    let escaped = escape_html(lang);
    format!(
        r#"<div class="code-wrapper" data-lang="{escaped}"><pre><code class="language-{escaped}">{}</code></pre></div>"#,
        highlight(lang, text)
    )
}

/// Highlight `code` as `lang`, or escape it when the language is unknown.
fn highlight(lang: &str, code: &str) -> String {
    if lang == "plaintext" {
        return escape_html(code);
    }
    let Some(syntax) = SYNTAXES.find_syntax_by_token(lang) else {
        return escape_html(code);
    };
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            debug!(lang, error = %e, "highlighting failed, using plain text");
            return escape_html(code);
        }
    }
    generator.finalize()
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Give every heading without an explicit id a slug of its text, suffixed
/// with `-N` on repeats.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut used: HashMap<String, usize> = HashMap::new();
    for i in 0..events.len() {
        if !matches!(&events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let mut text = String::new();
        for event in &events[i + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }
        let base = heading_slug(&text);
        if base.is_empty() {
            continue;
        }
        let count = used.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }
}

fn heading_slug(text: &str) -> String {
    let mut slug = String::new();
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

// ============================================================================
// Plain text
// ============================================================================

/// Strip markdown and HTML down to searchable plain text.
pub fn plain_text(markdown: &str) -> String {
    static CODE_BLOCK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```[^`]*```").expect("valid regex"));
    static INLINE_CODE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`[^`]+`").expect("valid regex"));
    static IMAGE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("valid regex"));
    static LINK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));
    static COMMENT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<!--[\s\S]*?-->").expect("valid regex"));
    static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let text = CODE_BLOCK.replace_all(markdown, " ");
    let text = INLINE_CODE.replace_all(&text, " ");
    let text = IMAGE.replace_all(&text, " ");
    let text = LINK.replace_all(&text, "$1");
    let text = COMMENT.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");

    let text: String = text
        .chars()
        .filter_map(|c| match c {
            '#' | '>' | '|' => Some(' '),
            '*' | '_' | '~' => None,
            c => Some(c),
        })
        .collect();
    let text = SPACE.replace_all(&text, " ");

    text.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Estimated reading time in whole minutes, never below one.
pub fn read_time_minutes(markdown: &str) -> usize {
    let words = plain_text(markdown).split_whitespace().count();
    (words / WORDS_PER_MINUTE).max(1)
}

pub fn format_read_time(minutes: usize) -> String {
    format!("~{minutes} min read")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> String {
        MarkdownRenderer::new(false).render(md)
    }

    #[test]
    fn renders_basic_markdown() {
        let html = render("Some *emphasis* and a [link](a.html).");
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains(r#"<a href="a.html">link</a>"#));
    }

    #[test]
    fn wraps_fenced_code_with_language() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains(r#"<div class="code-wrapper" data-lang="rust">"#));
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.trim_end().ends_with("</div>"));
    }

    #[test]
    fn indented_code_is_plaintext() {
        let html = render("para\n\n    let x = 1;\n");
        assert!(html.contains(r#"data-lang="plaintext""#));
        assert!(html.contains("let x = 1;"));
        assert!(!html.contains("hl-"));
    }

    #[test]
    fn known_languages_get_token_classes() {
        let html = render("```rust\nfn main() { if true { return; } let s = \"hi\"; }\n```\n");
        assert!(html.contains(r#"<span class="hl-source hl-rust">"#));
        assert!(html.contains("hl-keyword"));
        assert!(html.contains("hl-string"));
        assert!(html.contains("main"));
    }

    #[test]
    fn unknown_languages_are_escaped_plain_text() {
        let html = render("```nosuchlang\n<b>&</b>\n```\n");
        assert!(html.contains(r#"data-lang="nosuchlang""#));
        assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
        assert!(!html.contains("hl-"));
    }

    #[test]
    fn raw_html_is_escaped_by_default() {
        let html = render("<script>alert(1)</script>\n");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn raw_html_passes_when_allowed() {
        let html = MarkdownRenderer::new(true).render("<span class=\"x\">hi</span>\n");
        assert!(html.contains(r#"<span class="x">"#));
    }

    #[test]
    fn allowed_html_is_not_sanitized() {
        let html = MarkdownRenderer::new(true).render("<script>alert(1)</script>\n");
        assert!(html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn comments_are_dropped() {
        let html = render("<!--\nnote to self\n-->\n\nVisible\n");
        assert!(!html.contains("note to self"));
        assert!(html.contains("Visible"));
    }

    #[test]
    fn headings_get_unique_ids() {
        let html = render("# Getting Started\n\n## Setup\n\n## Setup\n");
        assert!(html.contains(r#"<h1 id="getting-started">"#));
        assert!(html.contains(r#"<h2 id="setup">"#));
        assert!(html.contains(r#"<h2 id="setup-1">"#));
    }

    // =========================================================================
    // Plain text
    // =========================================================================

    #[test]
    fn plain_text_strips_markup() {
        let md = "# Title\n\nSome **bold** text with [a link](x.html) and `code`.\n\n\
                  ![img](a.png)\n\n```\nlet x = 1;\n```\n<!-- hidden --> <b>tag</b>";
        assert_eq!(
            plain_text(md),
            "Title Some bold text with a link and . tag"
        );
    }

    #[test]
    fn plain_text_drops_control_characters() {
        assert_eq!(plain_text("a\u{0007}b"), "ab");
    }

    #[test]
    fn read_time_has_one_minute_floor() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes("just a few words"), 1);
    }

    #[test]
    fn read_time_rounds_down() {
        let words = "word ".repeat(450);
        assert_eq!(read_time_minutes(&words), 2);
        assert_eq!(format_read_time(2), "~2 min read");
    }
}
