use std::cell::RefCell;

use super::{commit_touches, Repository, HEAD};
use crate::domain::tag::matches_any_prefix;
use crate::domain::{Commit, CommitParser, FileChange};
use crate::error::{GotaggerError, Result};

/// In-memory linear history for testing without actual git operations.
///
/// Commits are appended oldest first; HEAD is the last commit. Tags created
/// through [Repository::create_tag] are recorded and visible to later calls.
pub struct MockRepository {
    parser: CommitParser,
    commits: Vec<Commit>,
    tags: RefCell<Vec<(String, String)>>,
    dirty: bool,
    pushed: RefCell<Vec<(String, String)>>,
    fail_create: Option<String>,
    fail_push: Option<String>,
    fail_delete: bool,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Result<Self> {
        Ok(MockRepository {
            parser: CommitParser::new()?,
            commits: Vec::new(),
            tags: RefCell::new(Vec::new()),
            dirty: false,
            pushed: RefCell::new(Vec::new()),
            fail_create: None,
            fail_push: None,
            fail_delete: false,
        })
    }

    /// Append a commit touching `files`; returns its hash
    pub fn commit(&mut self, message: &str, files: &[&str]) -> String {
        let changes = files.iter().map(|f| FileChange::modified(*f)).collect();
        self.commit_changes(message, changes)
    }

    /// Append a commit with explicit file changes; returns its hash
    pub fn commit_changes(&mut self, message: &str, changes: Vec<FileChange>) -> String {
        let hash = format!("{:040x}", self.commits.len() + 1);
        let commit = self
            .parser
            .parse(message)
            .with_hash(hash.clone())
            .with_changes(changes);
        self.commits.push(commit);
        hash
    }

    /// Add a tag pointing at a commit hash
    pub fn add_tag(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.tags.borrow_mut().push((name.into(), hash.into()));
    }

    /// Tag the current HEAD commit
    pub fn tag_head(&mut self, name: impl Into<String>) {
        let hash = self.commits.last().map(|c| c.hash.clone()).unwrap_or_default();
        self.add_tag(name, hash);
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Make creation of the named tag fail
    pub fn fail_create_of(&mut self, name: impl Into<String>) {
        self.fail_create = Some(name.into());
    }

    /// Make every push fail with the given remote message
    pub fn fail_push_with(&mut self, message: impl Into<String>) {
        self.fail_push = Some(message.into());
    }

    /// Make every tag deletion fail
    pub fn fail_deletes(&mut self) {
        self.fail_delete = true;
    }

    /// All tag names currently in the repository
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.borrow().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Tags pushed so far, as (remote, tag) pairs
    pub fn pushed(&self) -> Vec<(String, String)> {
        self.pushed.borrow().clone()
    }

    fn position(&self, rev: &str) -> Result<usize> {
        let hash = self.rev_parse(rev)?;
        self.commits
            .iter()
            .position(|c| c.hash == hash)
            .ok_or_else(|| GotaggerError::repository(format!("unknown revision '{}'", rev)))
    }
}

impl Repository for MockRepository {
    fn head(&self) -> Result<Commit> {
        self.commits
            .last()
            .cloned()
            .ok_or_else(|| GotaggerError::repository("repository has no commits"))
    }

    fn rev_list(&self, start: &str, end: &str, paths: &[&str]) -> Result<Vec<Commit>> {
        if start.is_empty() {
            return Err(GotaggerError::repository("must specify a start revision"));
        }

        let start = self.position(start)?;
        let stop = if end.is_empty() {
            None
        } else {
            Some(self.position(end)?)
        };

        Ok(self.commits[..=start]
            .iter()
            .enumerate()
            .rev()
            .take_while(|(i, _)| stop.map_or(true, |stop| *i > stop))
            .map(|(_, c)| c)
            .filter(|c| commit_touches(c, paths))
            .cloned()
            .collect())
    }

    fn tags(&self, rev: &str, prefixes: &[&str]) -> Result<Vec<String>> {
        let target = self.position(rev)?;
        let tags = self.tags.borrow();

        Ok(tags
            .iter()
            .filter(|(name, _)| matches_any_prefix(name, prefixes))
            .filter(|(_, hash)| {
                self.commits
                    .iter()
                    .position(|c| &c.hash == hash)
                    .is_some_and(|i| i <= target)
            })
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        let rev = rev.strip_suffix("^{commit}").unwrap_or(rev);
        if rev == HEAD {
            return self.head().map(|c| c.hash);
        }

        if let Some((_, hash)) = self.tags.borrow().iter().find(|(name, _)| name == rev) {
            return Ok(hash.clone());
        }

        self.commits
            .iter()
            .find(|c| c.hash == rev)
            .map(|c| c.hash.clone())
            .ok_or_else(|| GotaggerError::repository(format!("unknown revision '{}'", rev)))
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty)
    }

    fn create_tag(&self, hash: &str, name: &str, _message: &str, _signed: bool) -> Result<()> {
        if self.fail_create.as_deref() == Some(name) {
            return Err(GotaggerError::tag(format!("could not create tag {}", name)));
        }

        let mut tags = self.tags.borrow_mut();
        if tags.iter().any(|(existing, _)| existing == name) {
            return Err(GotaggerError::tag(format!("tag {} already exists", name)));
        }
        tags.push((name.to_string(), hash.to_string()));
        Ok(())
    }

    fn delete_tags(&self, names: &[String]) -> Result<()> {
        if self.fail_delete {
            return Err(GotaggerError::TagCleanup(
                names.iter().map(|n| format!("{}: locked", n)).collect(),
            ));
        }

        self.tags
            .borrow_mut()
            .retain(|(name, _)| !names.contains(name));
        Ok(())
    }

    fn push_tags(&self, names: &[String], remote: &str) -> Result<()> {
        if let Some(message) = &self.fail_push {
            return Err(GotaggerError::remote(message.clone()));
        }

        self.pushed
            .borrow_mut()
            .extend(names.iter().map(|n| (remote.to_string(), n.clone())));
        Ok(())
    }
}
