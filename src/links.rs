//! Internal `[[…]]` link rewriting.
//!
//! - `[[notes/setup]]` links to the page generated from `notes/setup.md`.
//! - `[[notes/]]` (trailing slash) links to the `notes/` directory index.
//! - A leading `/` resolves from the content root; anything else resolves
//!   from the referencing document's directory.
//!
//! Output is ordinary markdown link syntax with a relative href, so the
//! renderer produces the anchor and raw-HTML escaping never sees it. All
//! arithmetic happens on site-relative paths; output paths mirror input paths.
//! Brackets inside code spans and code blocks are left alone.

use crate::naming;
use crate::paths;
use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid regex"));

/// Rewrite every `[[target]]` in `body`.
///
/// `doc_dir` is the referencing document's directory relative to the content
/// root.
pub fn rewrite_links(body: &str, doc_dir: &Path) -> String {
    let code = code_ranges(body);
    WIKI_LINK
        .replace_all(body, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if code.iter().any(|range| range.contains(&start)) {
                return caps[0].to_string();
            }
            let target = &caps[1];
            let href = resolve_link(target, doc_dir).unwrap_or_else(|| {
                debug!(link = target, doc_dir = %doc_dir.display(), "unresolvable link, keeping literal target");
                target.to_string()
            });
            format!("[{}](<{}>)", escape_label(target), href)
        })
        .into_owned()
}

/// Byte ranges of inline code and code blocks in `body`.
fn code_ranges(body: &str) -> Vec<Range<usize>> {
    Parser::new(body)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// Relative href from `doc_dir` to the output of `target`.
///
/// Returns `None` when the target climbs above the content root.
pub fn resolve_link(target: &str, doc_dir: &Path) -> Option<String> {
    let target = target.trim();
    let is_dir = target.ends_with('/');
    let trimmed = target.trim_end_matches('/');

    let target_rel: PathBuf = match trimmed.strip_prefix('/') {
        Some(from_root) => paths::normalize(Path::new(from_root))?,
        None if trimmed.is_empty() && is_dir => PathBuf::new(),
        None => paths::normalize(&doc_dir.join(trimmed))?,
    };

    let output = if is_dir {
        target_rel.join("index.html")
    } else {
        let name = target_rel.file_name()?.to_string_lossy().into_owned();
        let stem = strip_document_extension(&name);
        let file = format!("{}.html", naming::slugify(stem));
        match target_rel.parent() {
            Some(parent) => parent.join(file),
            None => PathBuf::from(file),
        }
    };

    Some(paths::relative_href(doc_dir, &output))
}

fn strip_document_extension(name: &str) -> &str {
    naming::DOCUMENT_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(&format!(".{ext}")))
        .unwrap_or(name)
}

fn escape_label(label: &str) -> String {
    label.replace('[', "\\[").replace(']', "\\]")
}
