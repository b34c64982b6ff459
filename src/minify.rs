//! Minification for pages, feeds, and static assets.
//!
//! HTML goes straight through `minify-html`. Standalone stylesheets and
//! scripts are minified by wrapping them in a `<style>`/`<script>` element,
//! running the HTML minifier with CSS/JS minification on, and unwrapping
//! the result. If the wrapper does not survive, the source is kept as is.

use std::path::Path;

/// Static asset kinds that can be minified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("css") => Some(AssetKind::Css),
            Some("js") => Some(AssetKind::Js),
            _ => None,
        }
    }

    fn wrapper(self) -> (&'static str, &'static str) {
        match self {
            AssetKind::Css => ("<style>", "</style>"),
            AssetKind::Js => ("<script>", "</script>"),
        }
    }
}

fn cfg() -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    cfg
}

/// Minify a full HTML document.
pub fn html(source: &[u8]) -> Vec<u8> {
    minify_html::minify(source, &cfg())
}

/// Minify XML by trimming every line and dropping blank ones.
pub fn xml(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Minify a standalone stylesheet or script.
pub fn asset(kind: AssetKind, source: &str) -> String {
    let (open, close) = kind.wrapper();
    let wrapped = format!("{open}{source}{close}");
    let minified = minify_html::minify(wrapped.as_bytes(), &cfg());
    let minified = String::from_utf8_lossy(&minified);
    minified
        .trim()
        .strip_prefix(open)
        .and_then(|s| s.strip_suffix(close))
        .map(str::to_string)
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_smaller() {
        let source = b"<html>\n  <body>\n    <p>  hello   world </p>\n  </body>\n</html>\n";
        let out = html(source);
        assert!(out.len() < source.len());
        assert!(String::from_utf8_lossy(&out).contains("hello"));
    }

    #[test]
    fn xml_lines_are_trimmed() {
        assert_eq!(xml("<a>\n  <b>x</b>\n\n</a>\n"), "<a><b>x</b></a>");
    }

    #[test]
    fn css_is_minified_without_wrapper() {
        let out = asset(AssetKind::Css, "body {\n  color : red ;\n}\n");
        assert!(!out.contains("<style>"));
        assert!(out.contains("color:red"));
        assert!(out.len() < 25);
    }

    #[test]
    fn js_keeps_behaviour_text() {
        let out = asset(AssetKind::Js, "function  add (a, b) {\n  return a + b;\n}\n");
        assert!(!out.contains("<script>"));
        assert!(out.contains("return"));
    }

    #[test]
    fn asset_kind_from_extension() {
        assert_eq!(AssetKind::from_path(Path::new("a/b.css")), Some(AssetKind::Css));
        assert_eq!(AssetKind::from_path(Path::new("b.js")), Some(AssetKind::Js));
        assert_eq!(AssetKind::from_path(Path::new("b.png")), None);
    }
}
