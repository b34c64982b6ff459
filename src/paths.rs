//! Relative path resolution for generated pages.
//!
//! Every generated page references the stylesheet, the script, and a "back"
//! link through relative paths, so the site works from any host prefix and
//! from `file://`. The number of `../` hops a page needs depends on where it
//! lives:
//!
//! - **Plain directories** use their depth below the content root.
//! - **Section directories** (by default `blog/`) keep their assets next to
//!   the section: the section root is one hop away, a category two hops, and
//!   deeper directories one hop per segment after the section name. This does
//!   not follow the generic depth formula: a section nested under other
//!   directories still uses the fixed hop counts.
//!
//! Classification is a single ordered function returning a closed enum, so
//! callers never re-derive "am I in the blog?" from path strings.

use crate::config::SectionConfig;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Where a directory sits relative to the configured sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Outside of every section.
    Plain,
    /// The section directory itself, e.g. `blog/`.
    SectionRoot { section: String },
    /// A direct child of a section, e.g. `blog/Linux/`.
    SectionCategory { section: String, category: String },
    /// Anything deeper, e.g. `blog/Linux/Kernel/`. `segments` are the path
    /// segments after the section name.
    SectionNested {
        section: String,
        segments: Vec<String>,
    },
}

impl Position {
    /// Number of `../` hops from a directory at this position to the asset root.
    pub fn levels(&self, generic_depth: usize) -> usize {
        match self {
            Position::Plain => generic_depth,
            Position::SectionRoot { .. } => 1,
            Position::SectionCategory { .. } => 2,
            Position::SectionNested { segments, .. } => segments.len(),
        }
    }

    pub fn section(&self) -> Option<&str> {
        match self {
            Position::Plain => None,
            Position::SectionRoot { section }
            | Position::SectionCategory { section, .. }
            | Position::SectionNested { section, .. } => Some(section.as_str()),
        }
    }

    pub fn is_section_root(&self) -> bool {
        matches!(self, Position::SectionRoot { .. })
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Position::SectionCategory { category, .. } => Some(category.as_str()),
            _ => None,
        }
    }
}

/// Resolved relative references for every page generated in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// The `../` prefix in force for the directory.
    pub prefix: String,
    pub css: String,
    pub js: String,
    /// Back link, empty at the site root.
    pub back_url: String,
}

/// Number of path segments between `input_root` and `input_dir`.
///
/// Returns 0 when the two are equal. When the paths cannot be related
/// component-wise (mixed separators, one relative and one absolute) a
/// forward-slash string comparison is tried; if that fails too, a warning is
/// logged and 0 is returned.
pub fn depth(input_dir: &Path, input_root: &Path) -> usize {
    let dir = absolute_or_same(input_dir);
    let root = absolute_or_same(input_root);

    if dir == root {
        return 0;
    }
    if let Ok(rel) = dir.strip_prefix(&root) {
        return rel
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count();
    }

    let dir_str = to_forward_slashes(&dir.to_string_lossy());
    let root_str = to_forward_slashes(&root.to_string_lossy());
    let root_str = root_str.trim_end_matches('/');
    if let Some(rest) = dir_str.strip_prefix(root_str) {
        if rest.is_empty() || rest.starts_with('/') {
            return rest.split('/').filter(|s| !s.is_empty()).count();
        }
    }

    warn!(
        dir = %input_dir.display(),
        root = %input_root.display(),
        "cannot relate directory to content root, assuming depth 0"
    );
    0
}

/// Classify a site-relative directory path against the section table.
///
/// The first segment whose name is a configured section anchors the
/// classification.
pub fn classify(site_path: &Path, sections: &BTreeMap<String, SectionConfig>) -> Position {
    let segments = normal_segments(site_path);
    let Some(anchor) = segments.iter().position(|s| sections.contains_key(s)) else {
        return Position::Plain;
    };

    let section = segments[anchor].clone();
    let after = &segments[anchor + 1..];
    match after {
        [] => Position::SectionRoot { section },
        [category] => Position::SectionCategory {
            section,
            category: category.clone(),
        },
        _ => Position::SectionNested {
            section,
            segments: after.to_vec(),
        },
    }
}

/// Site-relative path of the section directory that `site_path` lies in.
pub fn section_root(site_path: &Path, section: &str) -> Option<PathBuf> {
    let segments = normal_segments(site_path);
    let anchor = segments.iter().position(|s| s == section)?;
    Some(segments[..=anchor].iter().collect())
}

/// Build the [`PathConfig`] for a directory.
pub fn resolve_asset_paths(
    css: &str,
    js: &str,
    position: &Position,
    generic_depth: usize,
) -> PathConfig {
    let levels = position.levels(generic_depth);
    let back_url = match position {
        Position::Plain => back_url(generic_depth),
        _ => "../index.html".to_string(),
    };
    PathConfig {
        prefix: "../".repeat(levels),
        css: prefix_asset(css, levels),
        js: prefix_asset(js, levels),
        back_url,
    }
}

/// Back link for a plain directory at `depth`.
///
/// - `0` → empty
/// - `1` → `../index.html`
/// - `n` → `n × "../"` followed by `index.html`
pub fn back_url(depth: usize) -> String {
    match depth {
        0 => String::new(),
        n => format!("{}index.html", "../".repeat(n)),
    }
}

/// Prepend `levels` hops to a site-root-relative asset path.
///
/// Absolute URLs are returned untouched and a leading `/` is stripped.
pub fn prefix_asset(path: &str, levels: usize) -> String {
    if is_external(path) {
        return path.to_string();
    }
    format!("{}{}", "../".repeat(levels), path.trim_start_matches('/'))
}

pub fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Web-style relative path from the directory `from_dir` to `target`, both
/// relative to the site root.
pub fn relative_href(from_dir: &Path, target: &Path) -> String {
    let diff = pathdiff::diff_paths(target, from_dir).unwrap_or_else(|| target.to_path_buf());
    web_path(&diff)
}

/// Join path components with `/` regardless of platform.
pub fn web_path(path: &Path) -> String {
    normal_segments_with_parents(path).join("/")
}

/// Lexically normalize a relative path (`.` dropped, `..` popped).
///
/// Returns `None` when the path climbs above its starting point.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                out.pop()?;
            }
            Component::Normal(s) => out.push(s.to_string_lossy().into_owned()),
        }
    }
    Some(out.iter().collect())
}

fn normal_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn normal_segments_with_parents(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect()
}

fn to_forward_slashes(s: &str) -> String {
    s.replace('\\', "/")
}

fn absolute_or_same(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
