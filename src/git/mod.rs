//! Git operations abstraction layer
//!
//! The version resolver only talks to a repository through the [Repository]
//! trait, so resolution logic can be exercised against an in-memory history.
//!
//! - [repository::Git2Repository]: implementation backed by the `git2` crate
//! - [mock::MockRepository]: in-memory implementation for tests
//!
//! ```rust,no_run
//! # use gotagger::git::{Git2Repository, Repository};
//! # fn example() -> gotagger::Result<()> {
//! let repo = Git2Repository::open(".")?;
//! let head = repo.head()?;
//! let commits = repo.rev_list("HEAD", "", &[])?;
//! println!("{} commits reachable from {}", commits.len(), head.hash);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Commit;
use crate::error::Result;

/// Revision name of the current commit
pub const HEAD: &str = "HEAD";

/// Repository operations the version resolver depends on.
///
/// Every method reads the current repository state; implementations must not
/// cache results between calls.
pub trait Repository {
    /// The parsed HEAD commit including its file changes.
    ///
    /// Fails if the repository has no commits.
    fn head(&self) -> Result<Commit>;

    /// Commits reachable from `start` but not from `end`, newest first.
    ///
    /// An empty `end` walks to the beginning of history. When `paths` is not
    /// empty only commits touching one of them are returned; a path matches
    /// itself and everything below it.
    fn rev_list(&self, start: &str, end: &str, paths: &[&str]) -> Result<Vec<Commit>>;

    /// Names of tags whose commit is reachable from `rev`, filtered by prefix.
    ///
    /// See [crate::domain::tag::matches_any_prefix] for the prefix rules.
    fn tags(&self, rev: &str, prefixes: &[&str]) -> Result<Vec<String>>;

    /// Resolve a revision expression to a commit hash
    fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Whether the working tree has staged, unstaged or untracked changes
    fn is_dirty(&self) -> Result<bool>;

    /// Create an annotated tag. Fails if the tag already exists.
    fn create_tag(&self, hash: &str, name: &str, message: &str, signed: bool) -> Result<()>;

    /// Delete tags, attempting every one and aggregating the failures
    fn delete_tags(&self, names: &[String]) -> Result<()>;

    /// Push tags to `remote` as `refs/tags/X:refs/tags/X`
    fn push_tags(&self, names: &[String], remote: &str) -> Result<()>;
}

/// Whether a changed file path falls under one of the given paths
pub(crate) fn path_matches(file: &str, paths: &[&str]) -> bool {
    if paths.is_empty() {
        return true;
    }

    paths.iter().any(|path| {
        let path = path.trim_start_matches("./").trim_end_matches('/');
        if path.is_empty() || path == "." {
            return true;
        }
        file == path
            || file
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Whether a commit touched one of the given paths
pub(crate) fn commit_touches(commit: &Commit, paths: &[&str]) -> bool {
    paths.is_empty()
        || commit
            .changes
            .iter()
            .flat_map(|change| change.paths())
            .any(|file| path_matches(file, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileChange;

    #[test]
    fn test_path_matches() {
        assert!(path_matches("bar/x.go", &[]));
        assert!(path_matches("bar/x.go", &["bar"]));
        assert!(path_matches("bar/x.go", &["./bar/"]));
        assert!(path_matches("bar", &["bar"]));
        assert!(!path_matches("barn/x.go", &["bar"]));
        assert!(path_matches("x.go", &["."]));
    }

    #[test]
    fn test_commit_touches() {
        let commit = Commit::default().with_changes(vec![FileChange::modified("sub/module/file")]);
        assert!(commit_touches(&commit, &["sub/module"]));
        assert!(!commit_touches(&commit, &["bar"]));
        assert!(!commit_touches(&Commit::default(), &["bar"]));
        assert!(commit_touches(&Commit::default(), &[]));
    }
}
