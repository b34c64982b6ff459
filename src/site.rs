//! Top-level build.
//!
//! ```text
//! build(content/, dist/)
//!   1. validate the content directory, create the output directory
//!   2. copy `assets.source_dir` (minified when enabled)
//!   3. write the built-in stylesheet/script where nothing was copied
//!   4. walk the tree (pages, indexes, search, tags, feeds, landing)
//!   5. robots.txt
//!   6. sitemap.xml over the finished output tree
//! ```
//!
//! Every build rewrites every artifact; nothing is cached between runs.

use crate::config::SiteConfig;
use crate::dates;
use crate::document::SourceDocument;
use crate::metadata;
use crate::minify::{self, AssetKind};
use crate::naming;
use crate::paths;
use crate::sitemap;
use crate::types::BuildReport;
use crate::vcs::RepositoryReader;
use crate::walk::{BuildError, Walker};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const DEFAULT_CSS: &str = include_str!("../static/style.css");
const DEFAULT_JS: &str = include_str!("../static/script.js");

pub const ROBOTS_FILE: &str = "robots.txt";

/// Build the whole site from `input` into `output`.
pub fn build(
    input: &Path,
    output: &Path,
    config: &SiteConfig,
    reader: &dyn RepositoryReader,
) -> Result<BuildReport, BuildError> {
    if !input.is_dir() {
        return Err(BuildError::MissingInput(input.to_path_buf()));
    }
    fs::create_dir_all(output).map_err(|source| BuildError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    let mut report = BuildReport {
        assets: copy_assets(input, output, config)?,
        ..Default::default()
    };
    report.assets += write_default_assets(output, config)?;

    if config.build.rss && config.base_url().is_none() {
        warn!("build.rss is set but site.url is empty, skipping feeds");
    }

    let outcome = Walker::new(input, output, config, reader).run()?;
    report.absorb(outcome.report);

    if config.build.robots {
        write_file(&output.join(ROBOTS_FILE), robots_txt(config))?;
    }

    if config.build.sitemap {
        if config.base_url().is_some() {
            report.sitemap_urls = sitemap::build_sitemap(output, config, &outcome.lastmod)?;
        } else {
            debug!("site.url is empty, skipping sitemap");
        }
    }

    info!(pages = report.pages, indexes = report.index_pages, "build finished");
    Ok(report)
}

/// A document as `check` sees it, without rendering anything.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedDocument {
    /// Source path relative to the content root.
    pub source: PathBuf,
    pub site_path: String,
    pub title: String,
    pub date: Option<String>,
    /// Whether `date` orders the document; unparsed dates sort last.
    pub date_parsed: bool,
    pub landing: bool,
}

/// Read every document a build would render and report what it resolves to.
///
/// Commit history is not consulted, so dates and titles are front matter or
/// file name only.
pub fn check(input: &Path, config: &SiteConfig) -> Result<Vec<CheckedDocument>, BuildError> {
    if !input.is_dir() {
        return Err(BuildError::MissingInput(input.to_path_buf()));
    }
    let asset_dir = (!config.assets.source_dir.is_empty())
        .then(|| input.join(&config.assets.source_dir));

    let walker = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
            !hidden && asset_dir.as_deref() != Some(e.path())
        });

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| BuildError::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !naming::is_document(path) {
            continue;
        }
        let rel = path.strip_prefix(input).unwrap_or(path).to_path_buf();
        let site_dir = rel.parent().unwrap_or(Path::new(""));
        if !config.build.recursive && site_dir.components().count() > 0 {
            continue;
        }

        let doc = SourceDocument::read(path)?;
        let name = naming::parse_document_name(path);
        let date = metadata::resolve(&[doc.front.date.as_deref()]);
        documents.push(CheckedDocument {
            site_path: paths::web_path(&site_dir.join(name.html_file())),
            title: metadata::resolve(&[doc.front.title.as_deref()])
                .unwrap_or_else(|| name.display_title.clone()),
            date_parsed: date.as_deref().and_then(dates::parse_date).is_some(),
            date,
            landing: doc.is_landing(),
            source: rel,
        });
    }
    Ok(documents)
}

/// Copy `assets.source_dir` into the output root, minifying CSS and JS when
/// `build.minify` is set. Returns the number of files copied.
pub fn copy_assets(input: &Path, output: &Path, config: &SiteConfig) -> Result<usize, BuildError> {
    if config.assets.source_dir.is_empty() {
        return Ok(0);
    }
    let source = input.join(&config.assets.source_dir);
    if !source.is_dir() {
        warn!(dir = %source.display(), "asset directory not found");
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(&source).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&source) else {
            continue;
        };
        let dest = output.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        match AssetKind::from_path(entry.path()).filter(|_| config.build.minify) {
            Some(kind) => {
                let text = fs::read_to_string(entry.path()).map_err(|source| BuildError::Read {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
                write_file(&dest, minify::asset(kind, &text))?;
            }
            None => {
                fs::copy(entry.path(), &dest).map_err(|source| BuildError::Write {
                    path: dest.clone(),
                    source,
                })?;
            }
        }
        copied += 1;
    }
    debug!(count = copied, "copied assets");
    Ok(copied)
}

/// Write the built-in stylesheet and script at the configured paths unless
/// something is already there or the path is an external URL.
pub fn write_default_assets(output: &Path, config: &SiteConfig) -> Result<usize, BuildError> {
    let mut written = 0;
    for (configured, contents, kind) in [
        (&config.assets.css, DEFAULT_CSS, AssetKind::Css),
        (&config.assets.js, DEFAULT_JS, AssetKind::Js),
    ] {
        if paths::is_external(configured) {
            continue;
        }
        let dest = output.join(configured.trim_start_matches('/'));
        if dest.exists() {
            continue;
        }
        let contents = if config.build.minify {
            minify::asset(kind, contents)
        } else {
            contents.to_string()
        };
        write_file(&dest, contents)?;
        written += 1;
    }
    Ok(written)
}

/// `robots.txt` allowing everything, pointing at the sitemap when the site
/// URL is known.
pub fn robots_txt(config: &SiteConfig) -> String {
    let mut robots = String::from("User-agent: *\nAllow: /\n");
    if let Some(base) = config.base_url().filter(|_| config.build.sitemap) {
        robots.push_str(&format!("\nSitemap: {base}/{}\n", sitemap::SITEMAP_FILE));
    }
    robots
}

fn write_file(path: &Path, contents: String) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}
