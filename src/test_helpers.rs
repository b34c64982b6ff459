//! Shared test utilities for the treesite test suite.
//!
//! Provides fixture writers, record builders, and a fixed-history
//! [`RepositoryReader`] so tests never depend on git being installed.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_fixture(tmp.path(), &[
//!     ("blog/First.md", "<!--\nDate: 2024-01-01\n-->\nHello"),
//!     ("about.md", "About me"),
//! ]);
//!
//! let history = FixedHistory::new()
//!     .with(&tmp.path().join("about.md"), "abc123", "Ada", "2024-02-03T04:05:06Z");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::types::BlogPost;
use crate::vcs::{CommitInfo, RepositoryReader, VcsError};
use crate::walk::DirFrame;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, contents)` pairs under `root`, creating
/// directories as needed.
pub fn write_fixture(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
    }
}

/// Read a generated file, panicking with its path when missing.
pub fn read_output(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// Directory frame for `site_dir` under the given roots.
pub fn frame_for(input: &Path, output: &Path, site_dir: &Path, config: &SiteConfig) -> DirFrame {
    DirFrame::new(input, output, site_dir, config)
}

// =========================================================================
// Record builders
// =========================================================================

/// A minimal post at `site_path`.
pub fn post(title: &str, site_path: &str, date: Option<&str>) -> BlogPost {
    let link = site_path.rsplit('/').next().unwrap_or(site_path).to_string();
    BlogPost {
        title: title.to_string(),
        link,
        site_path: site_path.to_string(),
        description: None,
        date: date.map(str::to_string),
        author: "Tester".to_string(),
        tags: Vec::new(),
        image: None,
        content: format!("{title} body"),
        read_time: 1,
        commit: None,
        source: PathBuf::from(site_path).with_extension("md"),
    }
}

pub fn tagged(mut post: BlogPost, tags: &[&str]) -> BlogPost {
    post.tags = tags.iter().map(|t| t.to_string()).collect();
    post
}

// =========================================================================
// Version control
// =========================================================================

/// A commit record; `timestamp` is RFC 3339.
pub fn commit(hash: &str, author: &str, timestamp: &str) -> CommitInfo {
    CommitInfo {
        hash: hash.to_string(),
        author: author.to_string(),
        timestamp: chrono::DateTime::parse_from_rfc3339(timestamp).unwrap(),
        url: None,
    }
}

/// Repository reader answering from a fixed table.
#[derive(Debug, Default)]
pub struct FixedHistory {
    commits: HashMap<PathBuf, CommitInfo>,
}

impl FixedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit for `path`; `timestamp` is RFC 3339.
    pub fn with(mut self, path: &Path, hash: &str, author: &str, timestamp: &str) -> Self {
        self.commits.insert(path.to_path_buf(), commit(hash, author, timestamp));
        self
    }
}

impl RepositoryReader for FixedHistory {
    fn last_commit(&self, path: &Path) -> Result<CommitInfo, VcsError> {
        self.commits
            .get(path)
            .cloned()
            .ok_or_else(|| VcsError::NoHistory(path.to_path_buf()))
    }
}
