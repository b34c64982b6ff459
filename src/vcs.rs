//! Version control lookups.
//!
//! Documents without an explicit `Author` or `Date` fall back to their last
//! commit. The lookup sits behind [`RepositoryReader`] so tests can supply
//! fixed histories.
//!
//! [`GitRepository`] opens the enclosing repository once with `gix` and
//! walks history from `HEAD` per document. Content outside a repository
//! gets [`NoRepository`], which always reports "no history".

use chrono::{DateTime, FixedOffset};
use gix::ThreadSafeRepository;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no commit history for {0}")]
    NoHistory(PathBuf),
    #[error("git error: {0}")]
    Git(String),
}

fn git_error(err: impl std::fmt::Display) -> VcsError {
    VcsError::Git(err.to_string())
}

/// Last commit touching a file.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    /// Link to the commit in a web viewer, when `build.git_web_url` is set.
    pub url: Option<String>,
}

impl CommitInfo {
    /// Commit date as `YYYY-MM-DD`, the form used for publish dates.
    pub fn date_ymd(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// Source of per-file commit metadata.
pub trait RepositoryReader: Sync {
    fn last_commit(&self, path: &Path) -> Result<CommitInfo, VcsError>;
}

/// Reader used when the content is not under version control.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepository;

impl RepositoryReader for NoRepository {
    fn last_commit(&self, path: &Path) -> Result<CommitInfo, VcsError> {
        Err(VcsError::NoHistory(path.to_path_buf()))
    }
}

/// Reader backed by the git repository enclosing the content directory.
///
/// The repository is opened once; each lookup takes a thread-local handle,
/// so documents can be resolved from rayon workers.
pub struct GitRepository {
    repo: ThreadSafeRepository,
    workdir: PathBuf,
    web_url: String,
}

impl GitRepository {
    /// Returns a reader when `dir` is inside a git work tree.
    pub fn discover(dir: &Path, web_url: &str) -> Option<Self> {
        let repo = match gix::discover(dir) {
            Ok(repo) => repo,
            Err(err) => {
                debug!(dir = %dir.display(), %err, "content is not inside a git repository");
                return None;
            }
        };
        let Some(workdir) = repo.workdir().and_then(|w| w.canonicalize().ok()) else {
            debug!(dir = %dir.display(), "repository has no work tree");
            return None;
        };
        debug!(workdir = %workdir.display(), "reading commit history");
        Some(Self {
            repo: repo.into_sync(),
            workdir,
            web_url: web_url.to_string(),
        })
    }

    /// `path` relative to the work tree root, as stored in commit trees.
    fn relative(&self, path: &Path) -> Result<PathBuf, VcsError> {
        let absolute = path.canonicalize()?;
        absolute
            .strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .map_err(|_| VcsError::NoHistory(path.to_path_buf()))
    }
}

/// Object id of the entry at `rel` in `commit`'s tree, if present.
fn entry_at(commit: &gix::Commit<'_>, rel: &Path) -> Result<Option<gix::ObjectId>, VcsError> {
    let tree = commit.tree().map_err(git_error)?;
    let entry = tree.lookup_entry_by_path(rel).map_err(git_error)?;
    Ok(entry.map(|e| e.object_id()))
}

fn commit_info(commit: &gix::Commit<'_>) -> Result<CommitInfo, VcsError> {
    let author = commit.author().map_err(git_error)?.name.to_string();
    let time = commit.time().map_err(git_error)?;
    let offset = FixedOffset::east_opt(time.offset)
        .ok_or_else(|| VcsError::Git(format!("bad timezone offset {}", time.offset)))?;
    let timestamp = DateTime::from_timestamp(time.seconds, 0)
        .ok_or_else(|| VcsError::Git(format!("bad commit time {}", time.seconds)))?
        .with_timezone(&offset);
    Ok(CommitInfo {
        hash: commit.id.to_string(),
        author,
        timestamp,
        url: None,
    })
}

impl RepositoryReader for GitRepository {
    /// Newest commit reachable from `HEAD` whose tree entry for `path`
    /// differs from its first parent's.
    fn last_commit(&self, path: &Path) -> Result<CommitInfo, VcsError> {
        let rel = self.relative(path)?;
        let repo = self.repo.to_thread_local();
        let head = repo.head_id().map_err(git_error)?;
        let head_commit = repo.find_commit(head.detach()).map_err(git_error)?;
        if entry_at(&head_commit, &rel)?.is_none() {
            return Err(VcsError::NoHistory(path.to_path_buf()));
        }

        let walk = repo.rev_walk([head.detach()]).all().map_err(git_error)?;
        for info in walk {
            let info = info.map_err(git_error)?;
            let commit = info.object().map_err(git_error)?;
            let current = entry_at(&commit, &rel)?;
            let previous = match commit.parent_ids().next() {
                Some(parent) => {
                    let parent = repo.find_commit(parent.detach()).map_err(git_error)?;
                    entry_at(&parent, &rel)?
                }
                None => None,
            };
            if current != previous {
                let mut info = commit_info(&commit)?;
                info.url = commit_url(&self.web_url, &info.hash);
                return Ok(info);
            }
        }
        Err(VcsError::NoHistory(path.to_path_buf()))
    }
}

/// `web_url/hash`, or `None` when either part is empty.
pub fn commit_url(web_url: &str, hash: &str) -> Option<String> {
    if web_url.is_empty() || hash.is_empty() {
        return None;
    }
    Some(format!("{}/{}", web_url.trim_end_matches('/'), hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::commit;
    use tempfile::TempDir;

    #[test]
    fn commit_info_formats_date_and_hash() {
        let info = commit("0123456789abcdef", "Ada Lovelace", "2024-03-02T10:15:00+01:00");
        assert_eq!(info.author, "Ada Lovelace");
        assert_eq!(info.date_ymd(), "2024-03-02");
        assert_eq!(info.short_hash(), "01234567");
    }

    #[test]
    fn commit_url_joins_with_single_slash() {
        assert_eq!(
            commit_url("https://git.example.com/site/commit/", "abc"),
            Some("https://git.example.com/site/commit/abc".to_string())
        );
        assert_eq!(commit_url("", "abc"), None);
        assert_eq!(commit_url("https://x", ""), None);
    }

    #[test]
    fn no_repository_has_no_history() {
        let result = NoRepository.last_commit(Path::new("a.md"));
        assert!(matches!(result, Err(VcsError::NoHistory(_))));
    }

    #[test]
    fn short_hash_of_short_input() {
        let mut info = commit("abc", "me", "2024-01-01T00:00:00Z");
        assert_eq!(info.short_hash(), "abc");
        info.hash = "0123456789".into();
        assert_eq!(info.short_hash(), "01234567");
    }

    #[test]
    fn discover_outside_a_repository_is_none() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        std::fs::create_dir_all(&content).unwrap();
        // A temp dir can still sit under a checkout; only assert when it doesn't.
        if gix::discover(&content).is_err() {
            assert!(GitRepository::discover(&content, "").is_none());
        }
    }

    #[test]
    fn paths_outside_the_work_tree_have_no_history() {
        let tmp = TempDir::new().unwrap();
        gix::init(tmp.path()).unwrap();
        let reader = GitRepository::discover(tmp.path(), "").unwrap();
        let outside = TempDir::new().unwrap();
        let file = outside.path().join("a.md");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(reader.last_commit(&file), Err(VcsError::NoHistory(_))));
    }
}
