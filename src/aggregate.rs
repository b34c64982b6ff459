//! Per-directory aggregate artifacts.
//!
//! Runs after a directory's children have been merged, so every artifact
//! sees the complete post set of its sub-tree:
//!
//! | Artifact              | Where                                  | When                                    |
//! |-----------------------|----------------------------------------|-----------------------------------------|
//! | `index.html`          | any directory                          | no landing page, no own index (or `generate_list`), something to list |
//! | `search-index.json`   | next to each generated index           | `build.search_index`                    |
//! | `tags/*.html`         | section root                           | section `tags = true`                   |
//! | `feed.xml`            | section root and section categories    | `build.rss`, section `feeds = true`, `site.url` set |
//!
//! Tag and feed failures are logged and skipped; index failures are fatal.

use crate::document::BuildContext;
use crate::feed::RssFeed;
use crate::naming;
use crate::paths;
use crate::templates::{
    self, IndexView, PostSummary, TagLink, TagPageView, TagsOverviewView,
};
use crate::types::{BlogPost, BuildReport, DirectoryLink, SearchEntry, newest_first};
use crate::walk::{BuildError, DirFrame};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const TAGS_DIR: &str = "tags";
pub const SEARCH_INDEX_FILE: &str = "search-index.json";

/// Result of [`emit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Emitted {
    pub report: BuildReport,
    pub index_written: bool,
}

/// Posts sharing one tag page.
#[derive(Debug, Clone)]
pub struct TagGroup<'p> {
    /// Display name; the alphabetically first spelling when several tags
    /// share a slug.
    pub name: &'p str,
    pub posts: Vec<&'p BlogPost>,
}

/// Tag groups keyed by page slug, each list newest first.
pub type TagIndex<'p> = BTreeMap<String, TagGroup<'p>>;

/// Write the aggregate artifacts for one directory.
pub fn emit(
    frame: &DirFrame,
    ctx: &BuildContext,
    posts: &[BlogPost],
    directories: Vec<DirectoryLink>,
    own_index: bool,
    landing: bool,
) -> Result<Emitted, BuildError> {
    let config = ctx.config;
    let mut emitted = Emitted::default();

    let wants_index = !landing && (config.build.generate_list || !own_index);
    if wants_index && (!posts.is_empty() || !directories.is_empty()) {
        write_index(frame, ctx, posts, directories, &mut emitted.report)?;
        emitted.index_written = true;
    }

    let Some(section) = frame.position.section() else {
        return Ok(emitted);
    };
    let policy = config.sections.get(section).cloned().unwrap_or_default();
    if posts.is_empty() {
        return Ok(emitted);
    }

    if frame.position.is_section_root() && policy.tags {
        emitted.report.tag_pages += write_tags(frame, ctx, posts);
    }

    let feed_title = if frame.position.is_section_root() {
        Some(config.site.title.clone())
    } else {
        frame
            .position
            .category()
            .map(|category| format!("{} - {}", config.site.title, category))
    };
    let wants_feed = policy.feeds && config.build.rss && config.base_url().is_some();
    if let Some(title) = feed_title.filter(|_| wants_feed) {
        match RssFeed::build(config, title, &frame.site_dir, posts).write(&frame.output_dir) {
            Ok(path) => {
                debug!(feed = %path.display(), "wrote feed");
                emitted.report.feeds += 1;
            }
            Err(e) => warn!(dir = %frame.output_dir.display(), error = %e, "skipping feed"),
        }
    }

    Ok(emitted)
}

fn write_index(
    frame: &DirFrame,
    ctx: &BuildContext,
    posts: &[BlogPost],
    directories: Vec<DirectoryLink>,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    let config = ctx.config;
    let mut sorted: Vec<&BlogPost> = posts.iter().collect();
    sorted.sort_by(|a, b| newest_first(a, b));

    let search = config.build.search_index && !sorted.is_empty();
    if search {
        let entries = search_entries(&sorted, &frame.site_dir);
        let path = frame.output_dir.join(SEARCH_INDEX_FILE);
        fs::create_dir_all(&frame.output_dir)?;
        fs::write(&path, serde_json::to_string(&entries)?)
            .map_err(|source| BuildError::Write { path, source })?;
        report.search_indexes += 1;
    }

    let title = naming::folder_title(&frame.input_dir, frame.is_root(), &config.site.title);
    let view = IndexView {
        title: &title,
        posts: sorted
            .iter()
            .map(|post| PostSummary::from_post(post, &frame.site_dir))
            .collect(),
        directories,
        search,
    };
    let path = frame.output_dir.join("index.html");
    let markup = templates::render_index(&ctx.chrome(frame), &view);
    templates::write_markup(&path, markup, config.build.minify)
        .map_err(|source| BuildError::Write {
            path: path.clone(),
            source,
        })?;
    debug!(index = %path.display(), posts = view.posts.len(), "wrote index");
    report.index_pages += 1;
    Ok(())
}

/// Search records with links relative to the directory's index page.
pub fn search_entries(posts: &[&BlogPost], site_dir: &Path) -> Vec<SearchEntry> {
    posts
        .iter()
        .map(|post| SearchEntry {
            title: post.title.clone(),
            link: post.href_from(site_dir),
            description: post.description.clone().unwrap_or_default(),
            content: post.content.clone(),
            date: post.date.clone().unwrap_or_default(),
        })
        .collect()
}

/// Group posts by tag.
pub fn build_tag_index(posts: &[BlogPost]) -> TagIndex<'_> {
    let mut index: TagIndex = BTreeMap::new();
    for post in posts {
        for tag in &post.tags {
            let group = index.entry(naming::tag_slug(tag)).or_insert_with(|| TagGroup {
                name: tag.as_str(),
                posts: Vec::new(),
            });
            if tag.as_str() < group.name {
                group.name = tag.as_str();
            }
            // "c lang" and "c-lang" on one post still list it once
            if !group.posts.iter().any(|p| std::ptr::eq(*p, post)) {
                group.posts.push(post);
            }
        }
    }
    for group in index.values_mut() {
        group.posts.sort_by(|a, b| newest_first(a, b));
    }
    index
}

/// Write `tags/<slug>.html` per tag and `tags/index.html`. Returns the
/// number of pages written.
fn write_tags(frame: &DirFrame, ctx: &BuildContext, posts: &[BlogPost]) -> usize {
    let index = build_tag_index(posts);
    if index.is_empty() {
        return 0;
    }

    let tags_site_dir = frame.site_dir.join(TAGS_DIR);
    let tags_dir = frame.output_dir.join(TAGS_DIR);
    let mut chrome = ctx.chrome(frame);
    chrome.paths = paths::resolve_asset_paths(
        &ctx.config.assets.css,
        &ctx.config.assets.js,
        &paths::classify(&tags_site_dir, &ctx.config.sections),
        frame.depth + 1,
    );
    let minify_output = ctx.config.build.minify;
    let mut written = 0;

    let mut tag_chrome = chrome.clone();
    tag_chrome.paths.back_url = "index.html".to_string();
    for (slug, group) in &index {
        let view = TagPageView {
            tag: group.name,
            posts: group
                .posts
                .iter()
                .map(|post| PostSummary::from_post(post, &tags_site_dir))
                .collect(),
        };
        let path = tags_dir.join(format!("{slug}.html"));
        match templates::write_markup(&path, templates::render_tag_page(&tag_chrome, &view), minify_output) {
            Ok(()) => written += 1,
            Err(e) => warn!(tag = group.name, error = %e, "skipping tag page"),
        }
    }

    let overview = TagsOverviewView {
        tags: index
            .iter()
            .map(|(slug, group)| {
                (
                    TagLink {
                        name: group.name.to_string(),
                        href: Some(format!("{slug}.html")),
                    },
                    group.posts.len(),
                )
            })
            .collect(),
    };
    let path = tags_dir.join("index.html");
    match templates::write_markup(&path, templates::render_tags_overview(&chrome, &overview), minify_output) {
        Ok(()) => written += 1,
        Err(e) => warn!(error = %e, "skipping tags overview"),
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::{frame_for, post, read_output, tagged};
    use crate::vcs::NoRepository;
    use tempfile::TempDir;

    #[test]
    fn tag_index_is_alphabetical_and_newest_first() {
        let posts = vec![
            tagged(post("Old", "blog/old.html", Some("2020-01-01")), &["rust", "cli"]),
            tagged(post("New", "blog/new.html", Some("2024-01-01")), &["rust"]),
        ];
        let index = build_tag_index(&posts);
        let tags: Vec<&str> = index.values().map(|g| g.name).collect();
        assert_eq!(tags, vec!["cli", "rust"]);
        let rust: Vec<&str> = index["rust"].posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(rust, vec!["New", "Old"]);
    }

    #[test]
    fn tags_with_the_same_slug_share_a_page() {
        let posts = vec![
            tagged(post("Both", "blog/both.html", Some("2024-02-01")), &["c-lang", "c lang"]),
            tagged(post("Spaced", "blog/spaced.html", Some("2024-01-01")), &["c lang"]),
            tagged(post("Dashed", "blog/dashed.html", Some("2023-01-01")), &["c-lang"]),
        ];
        let index = build_tag_index(&posts);
        assert_eq!(index.len(), 1);
        let group = &index["c-lang"];
        assert_eq!(group.name, "c lang");
        let titles: Vec<&str> = group.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Both", "Spaced", "Dashed"]);
    }

    #[test]
    fn search_entries_link_from_index_directory() {
        let p = post("Kernel", "blog/Linux/Kernel.html", Some("2024-01-01"));
        let entries = search_entries(&[&p], Path::new("blog"));
        assert_eq!(entries[0].link, "Linux/Kernel.html");
        assert_eq!(entries[0].date, "2024-01-01");
        assert_eq!(entries[0].description, "");
    }

    #[test]
    fn nothing_to_list_means_no_index() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let ctx = BuildContext::new(&config, &NoRepository);
        let frame = frame_for(tmp.path(), &tmp.path().join("out"), Path::new("docs"), &config);
        let emitted = emit(&frame, &ctx, &[], vec![], false, false).unwrap();
        assert!(!emitted.index_written);
        assert!(!tmp.path().join("out/docs/index.html").exists());
    }

    #[test]
    fn landing_suppresses_index() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let ctx = BuildContext::new(&config, &NoRepository);
        let frame = frame_for(tmp.path(), &tmp.path().join("out"), Path::new(""), &config);
        let posts = vec![post("A", "a.html", None)];
        let emitted = emit(&frame, &ctx, &posts, vec![], true, true).unwrap();
        assert!(!emitted.index_written);
    }

    #[test]
    fn section_root_writes_index_search_and_tags() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("content");
        let output = tmp.path().join("out");
        fs::create_dir_all(input.join("blog")).unwrap();
        let config = SiteConfig::default();
        let ctx = BuildContext::new(&config, &NoRepository);
        let frame = frame_for(&input, &output, Path::new("blog"), &config);
        let posts = vec![
            tagged(post("Kernel", "blog/Linux/Kernel.html", Some("2024-01-01")), &["linux", "c lang"]),
            tagged(post("Intro", "blog/Intro.html", Some("2023-01-01")), &["linux"]),
        ];

        let emitted = emit(&frame, &ctx, &posts, vec![], false, false).unwrap();
        assert!(emitted.index_written);
        assert_eq!(emitted.report.index_pages, 1);
        assert_eq!(emitted.report.search_indexes, 1);
        assert_eq!(emitted.report.tag_pages, 3);
        assert_eq!(emitted.report.feeds, 0);

        let index = read_output(&output, "blog/index.html");
        assert!(index.find("Kernel").unwrap() < index.find("Intro").unwrap());

        let search: serde_json::Value =
            serde_json::from_str(&read_output(&output, "blog/search-index.json")).unwrap();
        assert_eq!(search[0]["link"], "Linux/Kernel.html");

        let tag_page = read_output(&output, "blog/tags/c-lang.html");
        assert!(tag_page.contains(r#"href="../Linux/Kernel.html""#));
        assert!(tag_page.contains(r#"href="../../css/style.css""#));
        let overview = read_output(&output, "blog/tags/index.html");
        assert!(overview.contains(r#"href="linux.html""#));
        assert!(overview.contains("(2)"));
        assert!(overview.contains(r#"href="../index.html""#));
    }

    #[test]
    fn feeds_at_root_and_category_only() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("content");
        let output = tmp.path().join("out");
        let mut config = SiteConfig::default();
        config.build.rss = true;
        config.site.url = "https://example.com".into();
        let ctx = BuildContext::new(&config, &NoRepository);
        let posts = vec![post("Kernel", "blog/Linux/Deep/Kernel.html", Some("2024-01-01"))];

        for (dir, expect) in [("blog", true), ("blog/Linux", true), ("blog/Linux/Deep", false)] {
            let frame = frame_for(&input, &output, Path::new(dir), &config);
            let emitted = emit(&frame, &ctx, &posts, vec![], false, false).unwrap();
            assert_eq!(emitted.report.feeds == 1, expect, "{dir}");
        }
        let category_feed = read_output(&output, "blog/Linux/feed.xml");
        assert!(category_feed.contains("My Site - Linux"));
    }

    #[test]
    fn feeds_need_site_url() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.rss = true;
        let ctx = BuildContext::new(&config, &NoRepository);
        let frame = frame_for(tmp.path(), &tmp.path().join("out"), Path::new("blog"), &config);
        let posts = vec![post("A", "blog/A.html", None)];
        let emitted = emit(&frame, &ctx, &posts, vec![], false, false).unwrap();
        assert_eq!(emitted.report.feeds, 0);
    }
}
