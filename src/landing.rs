//! Landing pages.
//!
//! An `index` document with `Template: landing` replaces the directory's
//! index page with a terminal-style home page:
//!
//! ```markdown
//! <!--
//! Title: Home
//! Template: landing
//! -->
//! <!-- Section: whoami -->
//! Someone who writes things down.
//!
//! <!-- Section: cat now.txt -->
//! Learning Rust.
//!
//! <!-- Links -->
//! - [blog](blog/index.html)
//! - [code](https://github.com/someone)
//! ```
//!
//! Below the sections it lists the most recent section posts from the
//! directory's sub-tree.

use crate::document::{BuildContext, SourceDocument};
use crate::markdown::MarkdownRenderer;
use crate::metadata;
use crate::paths::{self, Position};
use crate::templates::{self, HeadMeta, LandingLink, LandingSection, LandingView, PostSummary};
use crate::types::{BlogPost, newest_first};
use crate::walk::{BuildError, DirFrame};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Number of recent posts shown on a landing page.
pub const RECENT_POSTS: usize = 5;

const LINKS_MARKER: &str = "<!-- Links -->";

static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*Section:\s*(.+?)\s*-->").expect("valid regex"));

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

/// Split a landing body into rendered sections.
///
/// Each section runs from its marker to the next one; the last ends at the
/// links marker or the end of the body. Empty sections are dropped.
pub fn extract_sections(body: &str, renderer: &MarkdownRenderer) -> Vec<LandingSection> {
    let markers: Vec<_> = SECTION_MARKER.captures_iter(body).collect();
    markers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let start = whole.end();
            let end = match markers.get(i + 1).and_then(|next| next.get(0)) {
                Some(next) => next.start(),
                None => body[start..]
                    .find(LINKS_MARKER)
                    .map_or(body.len(), |offset| start + offset),
            };
            let content = body[start..end].trim();
            (!content.is_empty()).then(|| LandingSection {
                command: caps[1].to_string(),
                content_html: renderer.render(content),
            })
        })
        .collect()
}

/// Markdown links following the links marker.
pub fn extract_links(body: &str) -> Vec<LandingLink> {
    let Some(idx) = body.find(LINKS_MARKER) else {
        return Vec::new();
    };
    MARKDOWN_LINK
        .captures_iter(&body[idx + LINKS_MARKER.len()..])
        .map(|caps| {
            let url = caps[2].trim().to_string();
            LandingLink {
                name: caps[1].to_string(),
                external: url.starts_with("http://") || url.starts_with("https://"),
                url,
            }
        })
        .collect()
}

/// Most recent posts that live inside a section.
pub fn recent_section_posts<'p>(
    posts: &'p [BlogPost],
    ctx: &BuildContext,
    limit: usize,
) -> Vec<&'p BlogPost> {
    let mut recent: Vec<&BlogPost> = posts
        .iter()
        .filter(|post| {
            let dir = Path::new(&post.site_path).parent().unwrap_or(Path::new(""));
            paths::classify(dir, &ctx.config.sections) != Position::Plain
        })
        .collect();
    recent.sort_by(|a, b| newest_first(a, b));
    recent.truncate(limit);
    recent
}

/// Render `doc` as the directory's `index.html`.
pub fn build_landing(
    doc: &SourceDocument,
    frame: &DirFrame,
    ctx: &BuildContext,
    posts: &[BlogPost],
) -> Result<(), BuildError> {
    let front = &doc.front;
    let title = metadata::resolve(&[front.title.as_deref()]).unwrap_or_else(|| "Home".into());
    let settings = metadata::parse_settings(front.settings.as_deref());

    let recent = recent_section_posts(posts, ctx, RECENT_POSTS)
        .into_iter()
        .map(|post| PostSummary::from_post(post, &frame.site_dir))
        .collect();

    let view = LandingView {
        title: &title,
        meta: HeadMeta {
            description: front.description.as_deref(),
            author: front.author.as_deref(),
            image: front.image.as_deref(),
            url: ctx.config.base_url().map(|base| {
                let dir = paths::web_path(&frame.site_dir);
                if dir.is_empty() {
                    format!("{base}/")
                } else {
                    format!("{base}/{dir}/")
                }
            }),
        },
        sections: extract_sections(&doc.body, &ctx.renderer),
        links: extract_links(&doc.body),
        recent,
        settings: &settings,
    };

    let out_path = frame.output_dir.join("index.html");
    let markup = templates::render_landing(&ctx.chrome(frame), &view);
    templates::write_markup(&out_path, markup, ctx.config.build.minify).map_err(|source| {
        BuildError::Write {
            path: out_path.clone(),
            source,
        }
    })?;
    debug!(page = %out_path.display(), "wrote landing page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::post;
    use crate::vcs::NoRepository;

    const BODY: &str = "\n<!-- Section: whoami -->\nA **writer**.\n\n<!--Section:   cat now.txt   -->\nLearning.\n<!-- Section: empty -->\n\n<!-- Links -->\n- [blog](blog/index.html)\n- [code](https://github.com/someone)\n";

    #[test]
    fn sections_split_at_markers() {
        let sections = extract_sections(BODY, &MarkdownRenderer::new(false));
        let commands: Vec<&str> = sections.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(commands, vec!["whoami", "cat now.txt"]);
        assert!(sections[0].content_html.contains("<strong>writer</strong>"));
        assert!(!sections[1].content_html.contains("blog/index.html"));
    }

    #[test]
    fn last_section_runs_to_end_without_links() {
        let sections = extract_sections("<!-- Section: ls -->\nfiles", &MarkdownRenderer::new(false));
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content_html.contains("files"));
    }

    #[test]
    fn links_are_classified() {
        let links = extract_links(BODY);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "blog/index.html");
        assert!(!links[0].external);
        assert!(links[1].external);
    }

    #[test]
    fn no_links_marker_means_no_links() {
        assert!(extract_links("[a](b)").is_empty());
    }

    #[test]
    fn recent_posts_only_come_from_sections() {
        let config = SiteConfig::default();
        let ctx = BuildContext::new(&config, &NoRepository);
        let posts: Vec<BlogPost> = (1..=7)
            .map(|day| {
                post(
                    &format!("P{day}"),
                    &format!("blog/P{day}.html"),
                    Some(&format!("2024-01-0{day}")),
                )
            })
            .chain([post("About", "about.html", Some("2030-01-01"))])
            .collect();

        let recent = recent_section_posts(&posts, &ctx, RECENT_POSTS);
        let titles: Vec<&str> = recent.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["P7", "P6", "P5", "P4", "P3"]);
    }
}
