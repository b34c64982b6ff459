//! Per-document page building.
//!
//! A markdown file is read once into an immutable [`SourceDocument`]. Its
//! metadata is resolved exactly once into [`ResolvedMeta`], which feeds both
//! the rendered page and the returned [`BlogPost`], so a page and its index
//! entry can never disagree on title, author or date.
//!
//! ## Resolution order
//!
//! | Field  | Sources (first non-empty wins)                         |
//! |--------|--------------------------------------------------------|
//! | title  | `Title` → file stem                                    |
//! | author | `Author` → last commit author → `site.author`          |
//! | date   | `Date` → last commit date (`YYYY-MM-DD`) → none        |

use crate::config::SiteConfig;
use crate::links;
use crate::markdown::{self, MarkdownRenderer};
use crate::metadata::{self, FrontMatter};
use crate::naming::{self, DocumentName};
use crate::paths;
use crate::templates::{self, Chrome, HeadMeta, PageView, TagLink};
use crate::types::BlogPost;
use crate::vcs::{CommitInfo, RepositoryReader};
use crate::walk::{BuildError, DirFrame};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source file after front matter extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub front: FrontMatter,
    /// Markdown body without the front matter block.
    pub body: String,
}

impl SourceDocument {
    pub fn read(path: &Path) -> Result<Self, BuildError> {
        let text = fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path, &text))
    }

    pub fn parse(path: &Path, text: &str) -> Self {
        let (front, body) = metadata::parse_front_matter(text);
        Self {
            path: path.to_path_buf(),
            front,
            body: body.to_string(),
        }
    }

    pub fn is_landing(&self) -> bool {
        self.front.is_landing()
    }
}

/// Services shared by every page of one build.
pub struct BuildContext<'a> {
    pub config: &'a SiteConfig,
    pub reader: &'a dyn RepositoryReader,
    pub renderer: MarkdownRenderer,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a SiteConfig, reader: &'a dyn RepositoryReader) -> Self {
        Self {
            config,
            reader,
            renderer: MarkdownRenderer::new(config.render.allow_html),
        }
    }

    /// Last commit for a document, `None` when history is unavailable.
    pub fn commit_for(&self, path: &Path) -> Option<CommitInfo> {
        match self.reader.last_commit(path) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no commit metadata");
                None
            }
        }
    }

    pub fn chrome<'f>(&'f self, frame: &DirFrame) -> Chrome<'f> {
        Chrome {
            site_title: &self.config.site.title,
            theme: &self.config.site.theme,
            paths: frame.paths.clone(),
        }
    }
}

/// Metadata after applying front matter, commit history and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeta {
    pub title: String,
    pub author: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub settings: BTreeSet<String>,
}

impl ResolvedMeta {
    pub fn resolve(
        front: &FrontMatter,
        name: &DocumentName,
        commit: Option<&CommitInfo>,
        config: &SiteConfig,
    ) -> Self {
        let commit_date = commit.map(CommitInfo::date_ymd);
        Self {
            title: metadata::resolve(&[front.title.as_deref(), Some(&name.display_title)])
                .unwrap_or_else(|| name.display_title.clone()),
            author: metadata::resolve(&[
                front.author.as_deref(),
                commit.map(|c| c.author.as_str()),
                Some(&config.site.author),
            ])
            .unwrap_or_default(),
            date: metadata::resolve(&[front.date.as_deref(), commit_date.as_deref()]),
            description: metadata::resolve(&[front.description.as_deref()]),
            image: metadata::resolve(&[front.image.as_deref()]),
            tags: metadata::normalize_tags(front.tags.as_deref()),
            settings: metadata::parse_settings(front.settings.as_deref()),
        }
    }
}

/// Render one document into `frame.output_dir` and return its record.
pub fn build_page(
    doc: &SourceDocument,
    frame: &DirFrame,
    ctx: &BuildContext,
) -> Result<BlogPost, BuildError> {
    let name = naming::parse_document_name(&doc.path);
    let commit = ctx.commit_for(&doc.path);
    let meta = ResolvedMeta::resolve(&doc.front, &name, commit.as_ref(), ctx.config);

    let body = links::rewrite_links(&doc.body, &frame.site_dir);
    let content_html = ctx.renderer.render(&body);
    let read_time = markdown::read_time_minutes(&doc.body);

    let file_name = name.html_file();
    let site_path = paths::web_path(&frame.site_dir.join(&file_name));
    let tag_links = tag_links(&meta.tags, frame, ctx.config);

    let view = PageView {
        title: &meta.title,
        meta: HeadMeta {
            description: meta.description.as_deref(),
            author: Some(&meta.author),
            image: meta.image.as_deref(),
            url: ctx.config.base_url().map(|base| format!("{base}/{site_path}")),
        },
        date: meta.date.as_deref(),
        read_time,
        tags: tag_links,
        settings: &meta.settings,
        content_html: &content_html,
        commit: commit.as_ref().filter(|_| ctx.config.build.commit_info),
    };

    let out_path = frame.output_dir.join(&file_name);
    let markup = templates::render_page(&ctx.chrome(frame), &view);
    templates::write_markup(&out_path, markup, ctx.config.build.minify).map_err(|source| {
        BuildError::Write {
            path: out_path.clone(),
            source,
        }
    })?;
    debug!(page = %out_path.display(), "wrote page");

    Ok(BlogPost {
        title: meta.title,
        link: file_name,
        site_path,
        description: meta.description,
        date: meta.date,
        author: meta.author,
        tags: meta.tags,
        image: meta.image,
        content: markdown::plain_text(&doc.body),
        read_time,
        commit,
        source: doc.path.clone(),
    })
}

/// Tag links for a page. Tags only link somewhere when the page's section
/// generates tag pages.
fn tag_links(tags: &[String], frame: &DirFrame, config: &SiteConfig) -> Vec<TagLink> {
    let tags_dir = frame
        .position
        .section()
        .filter(|section| config.sections.get(*section).is_some_and(|s| s.tags))
        .and_then(|section| paths::section_root(&frame.site_dir, section))
        .map(|root| root.join(crate::aggregate::TAGS_DIR));

    tags.iter()
        .map(|tag| TagLink {
            name: tag.clone(),
            href: tags_dir.as_ref().map(|dir| {
                let target = dir.join(format!("{}.html", naming::tag_slug(tag)));
                paths::relative_href(&frame.site_dir, &target)
            }),
        })
        .collect()
}
