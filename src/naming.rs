//! Output naming conventions.
//!
//! Source names are kept readable on disk (`My First Post.md`) while output
//! names are URL-friendly (`My-First-Post.html`):
//!
//! - Documents: spaces become hyphens, extension becomes `.html`.
//! - Tags: spaces and path separators become hyphens.
//! - Directory titles: `index_title.txt` when present, otherwise the
//!   directory name, otherwise (at the root) the site title.

use std::path::Path;

/// File name of the optional per-directory title override.
pub const INDEX_TITLE_FILE: &str = "index_title.txt";

/// Extensions treated as markdown documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Result of parsing a document file name like `My First Post.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentName {
    /// File stem as written, used as the title fallback.
    pub display_title: String,
    /// Output stem: spaces replaced with hyphens.
    pub slug: String,
}

impl DocumentName {
    pub fn html_file(&self) -> String {
        format!("{}.html", self.slug)
    }
}

/// Parse a document path into its display title and output slug.
pub fn parse_document_name(path: &Path) -> DocumentName {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    DocumentName {
        slug: slugify(&stem),
        display_title: stem,
    }
}

/// Spaces to hyphens. Everything else is kept as written.
pub fn slugify(name: &str) -> String {
    name.trim().replace(' ', "-")
}

/// File-safe name for a tag page.
pub fn tag_slug(tag: &str) -> String {
    tag.trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '-',
            c => c,
        })
        .collect()
}

/// Whether a path is a markdown document by extension.
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e))
}

/// Whether a document is a directory's own `index` document.
pub fn is_index_document(path: &Path) -> bool {
    is_document(path) && path.file_stem().is_some_and(|s| s == "index")
}

/// Resolve a directory's display title.
pub fn folder_title(dir: &Path, is_root: bool, site_title: &str) -> String {
    let custom = std::fs::read_to_string(dir.join(INDEX_TITLE_FILE))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(title) = custom {
        return title;
    }
    if is_root {
        return site_title.to_string();
    }
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| site_title.to_string())
}
