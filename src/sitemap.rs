//! Sitemap generation.
//!
//! Runs once after the walk over the materialised output tree, so every page
//! that exists on disk is listed, including index, tag and landing pages.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/index.html</loc>
//!     <changefreq>weekly</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use crate::config::SiteConfig;
use crate::minify;
use crate::paths;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

pub const SITEMAP_FILE: &str = "sitemap.xml";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk output tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("site.url is required to write a sitemap")]
    MissingSiteUrl,
}

/// Single URL entry in the sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlEntry {
    pub loc: String,
    /// `YYYY-MM-DD`, when the page's source has a known date.
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Scan `output_root` and write `sitemap.xml` into it.
///
/// `lastmod` maps site-relative page paths to `YYYY-MM-DD` dates collected
/// while the pages were rendered. Returns the number of listed URLs.
pub fn build_sitemap(
    output_root: &Path,
    config: &SiteConfig,
    lastmod: &BTreeMap<String, String>,
) -> Result<usize, SitemapError> {
    let base = config.base_url().ok_or(SitemapError::MissingSiteUrl)?;
    let entries = collect_entries(output_root, base, config, lastmod)?;
    let count = entries.len();

    let xml = into_xml(&entries);
    let xml = if config.build.minify {
        minify::xml(&xml)
    } else {
        xml
    };
    fs::write(output_root.join(SITEMAP_FILE), xml)?;
    Ok(count)
}

fn collect_entries(
    output_root: &Path,
    base: &str,
    config: &SiteConfig,
    lastmod: &BTreeMap<String, String>,
) -> Result<Vec<UrlEntry>, SitemapError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(output_root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("html")
        {
            continue;
        }
        let Ok(rel) = path.strip_prefix(output_root) else {
            continue;
        };
        let site_path = paths::web_path(rel);
        let (changefreq, priority) = frequency_and_priority(&site_path, config);
        entries.push(UrlEntry {
            loc: format!("{base}/{site_path}"),
            lastmod: lastmod.get(&site_path).cloned(),
            changefreq,
            priority,
        });
    }
    Ok(entries)
}

/// Change frequency and priority for a site-relative page path.
pub fn frequency_and_priority(site_path: &str, config: &SiteConfig) -> (&'static str, &'static str) {
    if site_path == "index.html" {
        return ("weekly", "1.0");
    }
    if site_path.ends_with("/index.html") {
        return ("weekly", "0.8");
    }
    let in_section = site_path
        .split('/')
        .any(|segment| config.sections.contains_key(segment));
    if in_section {
        ("monthly", "0.7")
    } else {
        ("monthly", "0.5")
    }
}

/// Generate sitemap XML.
pub fn into_xml(entries: &[UrlEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
