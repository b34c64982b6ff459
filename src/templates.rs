//! HTML templates.
//!
//! Every generated page is a [maud](https://maud.lambda.xyz/) function over a
//! typed view struct; there is no runtime template directory. All
//! interpolation is escaped except rendered markdown, which arrives as
//! already-sanitized HTML.
//!
//! ## Page kinds
//!
//! - **Document page**: one per markdown document.
//! - **Index page**: per directory, lists posts newest-first and subdirectories.
//! - **Tag page** / **tags overview**: under `<section>/tags/`.
//! - **Landing page**: an `index` document with `Template: landing`.
//!
//! Relative references (stylesheet, script, back link) come from the
//! directory's [`PathConfig`]; templates never compute paths themselves.

use crate::minify;
use crate::paths::PathConfig;
use crate::types::{BlogPost, DirectoryLink};
use crate::vcs::CommitInfo;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const GENERATOR: &str = concat!("treesite ", env!("TREESITE_BUILD_ID"));

/// Site-wide context shared by every template.
#[derive(Debug, Clone)]
pub struct Chrome<'a> {
    pub site_title: &'a str,
    pub theme: &'a str,
    pub paths: PathConfig,
}

/// `<head>` metadata beyond the title.
#[derive(Debug, Clone, Default)]
pub struct HeadMeta<'a> {
    pub description: Option<&'a str>,
    pub author: Option<&'a str>,
    pub image: Option<&'a str>,
    /// Canonical absolute URL, when the site URL is known.
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagLink {
    pub name: String,
    /// Tag page, when the document's section generates tag pages.
    pub href: Option<String>,
}

/// A post as listed on index, tag and landing pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub title: String,
    pub href: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub read_time: usize,
    pub tags: Vec<String>,
}

impl PostSummary {
    /// Summary with an href relative to the site-relative directory `from_dir`.
    pub fn from_post(post: &BlogPost, from_dir: &Path) -> Self {
        Self {
            title: post.title.clone(),
            href: post.href_from(from_dir),
            date: post.date.clone(),
            description: post.description.clone(),
            read_time: post.read_time,
            tags: post.tags.clone(),
        }
    }
}

pub struct PageView<'a> {
    pub title: &'a str,
    pub meta: HeadMeta<'a>,
    pub date: Option<&'a str>,
    pub read_time: usize,
    pub tags: Vec<TagLink>,
    pub settings: &'a BTreeSet<String>,
    pub content_html: &'a str,
    /// Shown only when `build.commit_info` is set.
    pub commit: Option<&'a CommitInfo>,
}

pub struct IndexView<'a> {
    pub title: &'a str,
    pub posts: Vec<PostSummary>,
    pub directories: Vec<DirectoryLink>,
    /// Whether a `search-index.json` sits next to this page.
    pub search: bool,
}

pub struct TagPageView<'a> {
    pub tag: &'a str,
    pub posts: Vec<PostSummary>,
}

pub struct TagsOverviewView {
    /// Alphabetical, with post counts.
    pub tags: Vec<(TagLink, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandingSection {
    pub command: String,
    pub content_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandingLink {
    pub name: String,
    pub url: String,
    pub external: bool,
}

pub struct LandingView<'a> {
    pub title: &'a str,
    pub meta: HeadMeta<'a>,
    pub sections: Vec<LandingSection>,
    pub links: Vec<LandingLink>,
    pub recent: Vec<PostSummary>,
    pub settings: &'a BTreeSet<String>,
}

/// Write a rendered page, minifying it when asked.
pub fn write_markup(path: &Path, markup: Markup, minify_output: bool) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let html = markup.into_string();
    if minify_output {
        fs::write(path, minify::html(html.as_bytes()))
    } else {
        fs::write(path, html)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    chrome: &Chrome,
    title: &str,
    meta: &HeadMeta,
    body_class: &str,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" data-theme=(chrome.theme) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="generator" content=(GENERATOR);
                title { (title) }
                @if let Some(description) = meta.description {
                    meta name="description" content=(description);
                }
                @if let Some(author) = meta.author {
                    meta name="author" content=(author);
                }
                meta property="og:title" content=(title);
                @if let Some(description) = meta.description {
                    meta property="og:description" content=(description);
                }
                @if let Some(image) = meta.image {
                    meta property="og:image" content=(image);
                }
                @if let Some(url) = &meta.url {
                    meta property="og:url" content=(url);
                    link rel="canonical" href=(url);
                }
                link rel="stylesheet" href=(chrome.paths.css);
            }
            body class=(body_class) {
                (content)
                script src=(chrome.paths.js) defer {}
            }
        }
    }
}

/// Renders the site header with the back link
fn site_header(chrome: &Chrome) -> Markup {
    html! {
        header.site-header {
            @if !chrome.paths.back_url.is_empty() {
                a.back-link href=(chrome.paths.back_url) { "← Back" }
            }
            span.site-title { (chrome.site_title) }
        }
    }
}

fn body_classes(kind: &str, settings: &BTreeSet<String>) -> String {
    std::iter::once(kind.to_string())
        .chain(settings.iter().map(|s| format!("setting-{s}")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn post_list(posts: &[PostSummary]) -> Markup {
    html! {
        ul.post-list {
            @for post in posts {
                li.post-item {
                    a.post-title href=(post.href) { (post.title) }
                    div.post-meta {
                        @if let Some(date) = &post.date {
                            time { (date) }
                        }
                        span.read-time { (crate::markdown::format_read_time(post.read_time)) }
                    }
                    @if let Some(description) = &post.description {
                        p.post-description { (description) }
                    }
                    @if !post.tags.is_empty() {
                        ul.post-tags {
                            @for tag in &post.tags {
                                li.tag { (tag) }
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Renders a document page
pub fn render_page(chrome: &Chrome, view: &PageView) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.page {
            article.post {
                header.post-header {
                    h1.post-title { (view.title) }
                    div.post-meta {
                        @if let Some(author) = view.meta.author {
                            span.author { (author) }
                        }
                        @if let Some(date) = view.date {
                            time { (date) }
                        }
                        span.read-time { (crate::markdown::format_read_time(view.read_time)) }
                    }
                    @if !view.tags.is_empty() {
                        ul.post-tags {
                            @for tag in &view.tags {
                                li.tag {
                                    @if let Some(href) = &tag.href {
                                        a href=(href) { (tag.name) }
                                    } @else {
                                        (tag.name)
                                    }
                                }
                            }
                        }
                    }
                }
                div.post-content {
                    (PreEscaped(view.content_html))
                }
                @if let Some(commit) = view.commit {
                    footer.commit-info {
                        "Last change "
                        @if let Some(url) = &commit.url {
                            a href=(url) { code { (commit.short_hash()) } }
                        } @else {
                            code { (commit.short_hash()) }
                        }
                        " by " (commit.author) " on " (commit.date_ymd())
                    }
                }
            }
        }
    };
    base_document(
        chrome,
        view.title,
        &view.meta,
        &body_classes("page-view", view.settings),
        content,
    )
}

/// Renders a directory index page
pub fn render_index(chrome: &Chrome, view: &IndexView) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.index-page {
            h1 { (view.title) }
            @if view.search {
                div.search data-index="search-index.json" {
                    input #search-input type="search" placeholder="Search…" aria-label="Search";
                    ul #search-results {}
                }
            }
            @if !view.directories.is_empty() {
                nav.directories {
                    ul {
                        @for dir in &view.directories {
                            li { a href=(dir.link) { (dir.name) } }
                        }
                    }
                }
            }
            @if !view.posts.is_empty() {
                (post_list(&view.posts))
            }
        }
    };
    base_document(
        chrome,
        view.title,
        &HeadMeta::default(),
        "index-view",
        content,
    )
}

/// Renders the page listing every post carrying one tag
pub fn render_tag_page(chrome: &Chrome, view: &TagPageView) -> Markup {
    let title = format!("Posts tagged with: {}", view.tag);
    let content = html! {
        (site_header(chrome))
        main.tag-page {
            h1 { (title) }
            (post_list(&view.posts))
            p { a href="index.html" { "All tags" } }
        }
    };
    base_document(chrome, &title, &HeadMeta::default(), "tag-view", content)
}

/// Renders the alphabetical list of all tags
pub fn render_tags_overview(chrome: &Chrome, view: &TagsOverviewView) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.tags-page {
            h1 { "All Tags" }
            ul.tag-cloud {
                @for (tag, count) in &view.tags {
                    li.tag {
                        a href=[tag.href.as_deref()] { (tag.name) }
                        " "
                        span.tag-count { "(" (count) ")" }
                    }
                }
            }
        }
    };
    base_document(chrome, "All Tags", &HeadMeta::default(), "tags-view", content)
}

/// Renders a landing page
pub fn render_landing(chrome: &Chrome, view: &LandingView) -> Markup {
    let content = html! {
        main.landing {
            h1.landing-title { (view.title) }
            @if let Some(description) = view.meta.description {
                p.landing-description { (description) }
            }
            @for section in &view.sections {
                section.landing-section data-command=(section.command) {
                    div.prompt { "$ " (section.command) }
                    div.output { (PreEscaped(&section.content_html)) }
                }
            }
            @if !view.recent.is_empty() {
                section.recent-posts {
                    h2 { "Recent posts" }
                    (post_list(&view.recent))
                }
            }
            @if !view.links.is_empty() {
                nav.landing-links {
                    ul {
                        @for link in &view.links {
                            li {
                                @if link.external {
                                    a href=(link.url) target="_blank" rel="noopener noreferrer" { (link.name) }
                                } @else {
                                    a href=(link.url) { (link.name) }
                                }
                            }
                        }
                    }
                }
            }
        }
    };
    base_document(
        chrome,
        view.title,
        &view.meta,
        &body_classes("landing-view", view.settings),
        content,
    )
}

// ============================================================================
// Tests
// ============================================================================
