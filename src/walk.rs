//! Directory tree traversal.
//!
//! [`Walker::walk`] handles one directory and recurses into its children:
//!
//! ```text
//! walk(dir)
//!   ├─ classify dir, resolve its PathConfig
//!   ├─ build every document (the own `index` document is not listed;
//!   │  a landing `index` is deferred)
//!   ├─ walk subdirectories in parallel (fork-join)
//!   ├─ merge child outcomes by value
//!   ├─ emit index, search index, tags, feeds
//!   └─ render the landing page (needs the merged posts)
//! ```
//!
//! Every frame owns its post list. Children hand theirs back through
//! [`DirOutcome`], so there is no shared aggregation state and parents only
//! emit after all of their children have finished.

use crate::aggregate;
use crate::config::{ConfigError, SiteConfig};
use crate::dates;
use crate::document::{self, BuildContext, SourceDocument};
use crate::landing;
use crate::naming;
use crate::paths::{self, PathConfig, Position};
use crate::sitemap::SitemapError;
use crate::types::{BlogPost, BuildReport, DirectoryLink};
use crate::vcs::RepositoryReader;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("content directory not found: {0}")]
    MissingInput(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),
}

/// Everything known about one directory before its documents are built.
#[derive(Debug, Clone, PartialEq)]
pub struct DirFrame {
    pub input_dir: PathBuf,
    /// Path relative to the content root; empty at the root.
    pub site_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Generic depth below the content root.
    pub depth: usize,
    pub position: Position,
    pub paths: PathConfig,
}

impl DirFrame {
    pub fn new(input_root: &Path, output_root: &Path, site_dir: &Path, config: &SiteConfig) -> Self {
        let input_dir = input_root.join(site_dir);
        let depth = paths::depth(&input_dir, input_root);
        let position = paths::classify(site_dir, &config.sections);
        let paths = paths::resolve_asset_paths(&config.assets.css, &config.assets.js, &position, depth);
        Self {
            output_dir: output_root.join(site_dir),
            site_dir: site_dir.to_path_buf(),
            input_dir,
            depth,
            position,
            paths,
        }
    }

    pub fn is_root(&self) -> bool {
        self.site_dir.as_os_str().is_empty()
    }
}

/// What a directory sub-tree hands back to its parent.
#[derive(Debug, Clone, Default)]
pub struct DirOutcome {
    /// Listed posts of the whole sub-tree.
    pub posts: Vec<BlogPost>,
    pub report: BuildReport,
    /// Whether the directory ended up with an `index.html`.
    pub has_index: bool,
    /// `YYYY-MM-DD` per rendered page, keyed by site path.
    pub lastmod: BTreeMap<String, String>,
}

impl DirOutcome {
    fn absorb(&mut self, child: DirOutcome) {
        self.posts.extend(child.posts);
        self.report.absorb(child.report);
        self.lastmod.extend(child.lastmod);
    }

    fn record_page(&mut self, post: &BlogPost) {
        self.report.pages += 1;
        if let Some(date) = lastmod_of(post) {
            self.lastmod.insert(post.site_path.clone(), date);
        }
    }
}

fn lastmod_of(post: &BlogPost) -> Option<String> {
    post.commit
        .as_ref()
        .map(|c| c.date_ymd())
        .or_else(|| post.date.as_deref().and_then(dates::parse_date).map(|d| dates::to_ymd(&d)))
}

/// Recursive site builder over one content root.
pub struct Walker<'a> {
    input_root: PathBuf,
    output_root: PathBuf,
    ctx: BuildContext<'a>,
    /// Absolute directories never descended into.
    skip: Vec<PathBuf>,
}

impl<'a> Walker<'a> {
    pub fn new(
        input_root: &Path,
        output_root: &Path,
        config: &'a SiteConfig,
        reader: &'a dyn RepositoryReader,
    ) -> Self {
        let mut skip = vec![absolute(output_root)];
        if !config.assets.source_dir.is_empty() {
            skip.push(absolute(&input_root.join(&config.assets.source_dir)));
        }
        Self {
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            ctx: BuildContext::new(config, reader),
            skip,
        }
    }

    /// Walk the whole tree from the content root.
    pub fn run(&self) -> Result<DirOutcome, BuildError> {
        self.walk(Path::new(""))
    }

    /// Build the directory at `site_dir` and everything below it.
    pub fn walk(&self, site_dir: &Path) -> Result<DirOutcome, BuildError> {
        let config = self.ctx.config;
        let frame = DirFrame::new(&self.input_root, &self.output_root, site_dir, config);
        debug!(dir = %frame.input_dir.display(), position = ?frame.position, "walking");

        let entries = self.collect_entries(&frame.input_dir)?;
        let (subdirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
            entries.into_iter().partition(|p| p.is_dir());

        let mut outcome = DirOutcome::default();
        let mut own_index = false;
        let mut landing_doc = None;

        for path in files.iter().filter(|p| naming::is_document(p)) {
            let doc = SourceDocument::read(path)?;
            let is_index = naming::is_index_document(path);
            if is_index {
                own_index = true;
                if doc.is_landing() {
                    landing_doc = Some(doc);
                    continue;
                }
            }
            let post = document::build_page(&doc, &frame, &self.ctx)?;
            outcome.record_page(&post);
            if !is_index {
                outcome.posts.push(post);
            }
        }

        let descend = config.build.recursive || frame.position.section().is_some();
        let children = if descend {
            subdirs
                .par_iter()
                .map(|dir| {
                    let name = dir
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.walk(&site_dir.join(&name)).map(|child| (name, child))
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let mut directories = Vec::new();
        for (name, child) in children {
            if child.has_index {
                directories.push(DirectoryLink {
                    link: format!("{name}/index.html"),
                    name,
                });
            }
            outcome.absorb(child);
        }

        let emitted = aggregate::emit(
            &frame,
            &self.ctx,
            &outcome.posts,
            directories,
            own_index,
            landing_doc.is_some(),
        )?;
        outcome.report.absorb(emitted.report);

        if let Some(doc) = landing_doc {
            landing::build_landing(&doc, &frame, &self.ctx, &outcome.posts)?;
            outcome.report.landing_pages += 1;
        }

        outcome.has_index = own_index || emitted.index_written;
        Ok(outcome)
    }

    fn collect_entries(&self, dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let read = fs::read_dir(dir).map_err(|source| BuildError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut entries: Vec<PathBuf> = read
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                let hidden = p
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'));
                !hidden && !(p.is_dir() && self.skip.contains(&absolute(p)))
            })
            .collect();
        entries.sort();
        Ok(entries)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
