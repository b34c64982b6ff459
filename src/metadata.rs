//! Document front matter and metadata resolution.
//!
//! A document may open with an HTML comment carrying `Key: Value` lines:
//!
//! ```text
//! <!--
//! Title: Kernel modules
//! Date: 2024-03-02
//! Tags: linux, kernel
//! -->
//! # Body starts here
//! ```
//!
//! Keys are case-sensitive; each line is split at its first colon and both
//! sides are trimmed. Lines without a colon are ignored. A block that never
//! closes is not front matter at all and the document is taken verbatim.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **Title**: front matter → file name
//! - **Author**: front matter → last commit author → configured default
//! - **Date**: front matter → last commit date (`YYYY-MM-DD`) → none

use std::collections::{BTreeMap, BTreeSet};

const OPEN: &str = "<!--";
const CLOSE: &str = "-->";

/// Parsed front matter. Unrecognised keys land in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub image: Option<String>,
    /// Raw comma-delimited tag list; see [`normalize_tags`].
    pub tags: Option<String>,
    pub template: Option<String>,
    /// Raw comma-delimited page-behaviour flags; see [`parse_settings`].
    pub settings: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl FrontMatter {
    /// Whether the document asks for the landing page template. The value
    /// is case-sensitive: only `landing` selects it.
    pub fn is_landing(&self) -> bool {
        self.template.as_deref().is_some_and(|t| t.trim() == "landing")
    }

    fn set(&mut self, key: &str, value: String) {
        let slot = match key {
            "Title" => &mut self.title,
            "Author" => &mut self.author,
            "Description" => &mut self.description,
            "Date" => &mut self.date,
            "Image" => &mut self.image,
            "Tags" => &mut self.tags,
            "Template" => &mut self.template,
            "Settings" => &mut self.settings,
            _ => {
                self.extra.insert(key.to_string(), value);
                return;
            }
        };
        *slot = Some(value);
    }
}

/// Split a document into its front matter and body.
///
/// Documents without a leading comment, or with one that never closes, come
/// back with empty front matter and the full text as body.
pub fn parse_front_matter(text: &str) -> (FrontMatter, &str) {
    let mut front = FrontMatter::default();
    let Some(rest) = text.strip_prefix(OPEN) else {
        return (front, text);
    };
    let Some(end) = rest.find(CLOSE) else {
        return (front, text);
    };

    for line in rest[..end].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        front.set(key, value.trim().to_string());
    }

    (front, &rest[end + CLOSE.len()..])
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
///
/// ```text
/// author: resolve(&[front.author, commit_author, default_author])
/// date:   resolve(&[front.date,   commit_date])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Split a comma-delimited tag list into trimmed, de-duplicated tags in
/// first-seen order.
pub fn normalize_tags(raw: Option<&str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(String::from)
        .collect()
}

/// Parse a comma-delimited settings list into a lower-cased flag set.
///
/// `"hide-topbar, Fullscreen"` → `{"fullscreen", "hide-topbar"}`
pub fn parse_settings(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys_and_body() {
        let text = "<!--\nTitle: Hello\nAuthor:  Jo  \nTags: a, b\n-->\n# Body";
        let (front, body) = parse_front_matter(text);
        assert_eq!(front.title.as_deref(), Some("Hello"));
        assert_eq!(front.author.as_deref(), Some("Jo"));
        assert_eq!(front.tags.as_deref(), Some("a, b"));
        assert_eq!(body, "\n# Body");
    }

    #[test]
    fn splits_on_first_colon_only() {
        let (front, _) = parse_front_matter("<!--\nImage: https://x.org/a.png\n-->");
        assert_eq!(front.image.as_deref(), Some("https://x.org/a.png"));
    }

    #[test]
    fn unknown_keys_go_to_extra() {
        let (front, _) = parse_front_matter("<!--\nMood: sunny\nNo colon here\n-->");
        assert_eq!(front.extra.get("Mood").map(String::as_str), Some("sunny"));
        assert_eq!(front.extra.len(), 1);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let (front, _) = parse_front_matter("<!--\ntitle: lower\n-->");
        assert_eq!(front.title, None);
        assert!(front.extra.contains_key("title"));
    }

    #[test]
    fn missing_block_returns_full_text() {
        let text = "# Just a heading\n<!-- Title: late -->";
        let (front, body) = parse_front_matter(text);
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, text);
    }

    #[test]
    fn unterminated_block_returns_full_text() {
        let text = "<!--\nTitle: Never closed\n# Body";
        let (front, body) = parse_front_matter(text);
        assert_eq!(front.title, None);
        assert_eq!(body, text);
    }

    #[test]
    fn landing_template_detection() {
        let (front, _) = parse_front_matter("<!--\nTemplate:  landing \n-->");
        assert!(front.is_landing());
        assert!(!FrontMatter::default().is_landing());

        for other in ["Landing", "LANDING", "landing-page"] {
            let (front, _) = parse_front_matter(&format!("<!--\nTemplate: {other}\n-->"));
            assert!(!front.is_landing(), "{other} selected the landing template");
        }
    }

    #[test]
    fn resolve_returns_first_non_empty() {
        assert_eq!(
            resolve(&[None, Some("  "), Some("git"), Some("default")]),
            Some("git".to_string())
        );
        assert_eq!(resolve(&[None, None]), None);
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated_in_order() {
        assert_eq!(
            normalize_tags(Some(" rust, linux ,rust,, web ")),
            vec!["rust", "linux", "web"]
        );
        assert!(normalize_tags(None).is_empty());
    }

    #[test]
    fn settings_are_lowercased() {
        let settings = parse_settings(Some("Hide-Topbar, fullscreen,"));
        assert!(settings.contains("hide-topbar"));
        assert!(settings.contains("fullscreen"));
        assert_eq!(settings.len(), 2);
    }
}
