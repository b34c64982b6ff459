//! Shared types passed between the walker, the aggregator, and the templates.

use crate::dates;
use crate::paths;
use crate::vcs::CommitInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Summary of one rendered document, produced once and moved up the directory
/// recursion by value.
///
/// Links for any emitting directory are derived from `site_path`, so records
/// never need rewriting while they bubble up.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub title: String,
    /// Output file name, relative to the document's own directory.
    pub link: String,
    /// Output path relative to the site root, with forward slashes.
    pub site_path: String,
    pub description: Option<String>,
    /// Resolved publish date: front matter, else last commit, else none.
    pub date: Option<String>,
    /// Resolved author: front matter, else last commit, else site default.
    pub author: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    /// Plain text for the search index.
    pub content: String,
    /// Estimated reading time in minutes.
    pub read_time: usize,
    pub commit: Option<CommitInfo>,
    pub source: PathBuf,
}

impl BlogPost {
    /// Relative href to this post from a site-relative directory.
    pub fn href_from(&self, dir: &Path) -> String {
        paths::relative_href(dir, Path::new(&self.site_path))
    }

    /// Absolute URL under `base_url`.
    pub fn absolute_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.site_path)
    }

    /// Instant used for newest-first ordering: the commit time when known,
    /// otherwise the parsed publish date.
    pub fn sort_instant(&self) -> Option<DateTime<Utc>> {
        self.commit
            .as_ref()
            .map(|c| c.timestamp.to_utc())
            .or_else(|| self.date.as_deref().and_then(dates::parse_date))
    }

    /// Publish instant for feeds: the parsed publish date only. A date
    /// that does not parse yields no instant even when a commit is known.
    pub fn publish_instant(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(dates::parse_date)
    }
}

/// Newest first; undated posts last; ties broken by title, then path.
pub fn newest_first(a: &BlogPost, b: &BlogPost) -> Ordering {
    b.sort_instant()
        .cmp(&a.sort_instant())
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.site_path.cmp(&b.site_path))
}

/// One entry of `search-index.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub content: String,
    pub date: String,
}

/// A subdirectory listed on an index page.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryLink {
    pub name: String,
    pub link: String,
}

/// Counts of what one build (or one directory sub-tree) wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub index_pages: usize,
    pub search_indexes: usize,
    pub tag_pages: usize,
    pub feeds: usize,
    pub landing_pages: usize,
    pub sitemap_urls: usize,
    pub assets: usize,
}

impl BuildReport {
    pub fn absorb(&mut self, other: BuildReport) {
        self.pages += other.pages;
        self.index_pages += other.index_pages;
        self.search_indexes += other.search_indexes;
        self.tag_pages += other.tag_pages;
        self.feeds += other.feeds;
        self.landing_pages += other.landing_pages;
        self.sitemap_urls += other.sitemap_urls;
        self.assets += other.assets;
    }
}
