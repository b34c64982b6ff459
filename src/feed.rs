//! RSS feed generation.
//!
//! Feeds are written at section roots (all posts of the section) and at each
//! section category (that category's posts). Links are absolute, so a site
//! URL is required.

use crate::config::SiteConfig;
use crate::dates;
use crate::minify;
use crate::templates::GENERATOR;
use crate::types::{BlogPost, newest_first};
use chrono::Utc;
use regex::Regex;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

pub const FEED_FILE: &str = "feed.xml";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("site.url is required to write feeds")]
    MissingSiteUrl,
    #[error("rss validation failed: {0}")]
    Validation(String),
}

// ============================================================================
// RssFeed Implementation
// ============================================================================

/// RSS feed for one directory.
pub struct RssFeed<'a> {
    config: &'a SiteConfig,
    title: String,
    /// Site-relative directory the feed is written to.
    dir: &'a Path,
    posts: Vec<&'a BlogPost>,
}

impl<'a> RssFeed<'a> {
    /// Collect and order the posts for a feed titled `title`.
    pub fn build(config: &'a SiteConfig, title: String, dir: &'a Path, posts: &'a [BlogPost]) -> Self {
        let mut posts: Vec<&BlogPost> = posts.iter().collect();
        posts.sort_by(|a, b| newest_first(a, b));
        Self {
            config,
            title,
            dir,
            posts,
        }
    }

    /// Generate the RSS XML.
    pub fn into_xml(self) -> Result<String, FeedError> {
        let base = self.config.base_url().ok_or(FeedError::MissingSiteUrl)?;
        let items: Vec<rss::Item> = self
            .posts
            .iter()
            .map(|post| post_to_item(post, base, self.config))
            .collect();

        let channel = ChannelBuilder::default()
            .title(self.title.clone())
            .link(directory_url(base, self.dir))
            .description(format!("Blog posts from {}", self.title))
            .language(Some(self.config.site.language.clone()))
            .generator(Some(GENERATOR.to_string()))
            .last_build_date(Some(dates::to_rfc2822(&Utc::now())))
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| FeedError::Validation(e.to_string()))?;
        Ok(channel.to_string())
    }

    /// Write `feed.xml` into `out_dir`, returning its path.
    pub fn write(self, out_dir: &Path) -> Result<PathBuf, FeedError> {
        let minify_output = self.config.build.minify;
        let xml = self.into_xml()?;
        let xml = if minify_output { minify::xml(&xml) } else { xml };
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(FEED_FILE);
        fs::write(&path, xml)?;
        Ok(path)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn post_to_item(post: &BlogPost, base: &str, config: &SiteConfig) -> rss::Item {
    let link = post.absolute_url(base);
    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .description(post.description.clone())
        .pub_date(post.publish_instant().map(|d| dates::to_rfc2822(&d)))
        .author(Some(format_author(&post.author, config)))
        .categories(
            post.tags
                .iter()
                .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
                .collect::<Vec<_>>(),
        )
        .build()
}

fn directory_url(base: &str, dir: &Path) -> String {
    let dir = crate::paths::web_path(dir);
    if dir.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{dir}/")
    }
}

/// Format an author as RSS 2.0 expects: `email@example.com (Name)`.
///
/// An author already in that form is kept. Otherwise the email is
/// `site.email` when configured, or synthesized from the name (lower-cased,
/// spaces to dots) at the site's domain.
pub fn format_author(author: &str, config: &SiteConfig) -> String {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$")
            .expect("valid regex")
    });

    let author = author.trim();
    if RE_VALID_AUTHOR.is_match(author) {
        return author.to_string();
    }
    let email = if config.site.email.is_empty() {
        format!(
            "{}@{}",
            author.to_lowercase().split_whitespace().collect::<Vec<_>>().join("."),
            site_domain(&config.site.url)
        )
    } else {
        config.site.email.clone()
    };
    format!("{email} ({author})")
}

/// Host part of the site URL, `example.com` when unknown.
pub fn site_domain(url: &str) -> String {
    let host = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default();
    if host.is_empty() {
        "example.com".to_string()
    } else {
        host.to_string()
    }
}
