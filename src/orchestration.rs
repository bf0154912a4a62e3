//! Tag creation and publishing
//!
//! Tags are created in order at one commit. Any failure removes the tags this
//! run created so a failed release leaves no partial state behind locally.

use tracing::{debug, info};

use crate::error::Result;
use crate::git::Repository;

/// Outcome of a successful tagging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResult {
    /// Tags created, in creation order
    pub tags: Vec<String>,
    /// Whether the tags were pushed to the remote
    pub pushed: bool,
}

/// Creates and optionally pushes release tags
pub struct TagOrchestrator<'a, R: Repository> {
    repo: &'a R,
    remote: Option<String>,
    signed: bool,
}

impl<'a, R: Repository> TagOrchestrator<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        TagOrchestrator {
            repo,
            remote: None,
            signed: false,
        }
    }

    /// Push created tags to `remote`
    pub fn push_to(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }

    /// Create signed tags
    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Tag `hash` with every name in `versions`, then push them if configured.
    ///
    /// On failure the tags created by this call are deleted. If the deletion
    /// fails too, its error is attached to the original one.
    pub fn publish(&self, hash: &str, versions: &[String]) -> Result<TagResult> {
        let mut created: Vec<String> = Vec::with_capacity(versions.len());
        for version in versions {
            let message = format!("Release {}", version);
            if let Err(err) = self.repo.create_tag(hash, version, &message, self.signed) {
                debug!(tag = %version, created = ?created, "tag creation failed, rolling back");
                return Err(err.with_cleanup(self.rollback(&created)));
            }
            created.push(version.clone());
        }
        info!(tags = ?created, hash, "created tags");

        let Some(remote) = &self.remote else {
            return Ok(TagResult {
                tags: created,
                pushed: false,
            });
        };

        if let Err(err) = self.repo.push_tags(&created, remote) {
            debug!(remote = %remote, "push failed, deleting local tags");
            return Err(err.with_cleanup(self.rollback(&created)));
        }
        info!(tags = ?created, remote = %remote, "pushed tags");

        Ok(TagResult {
            tags: created,
            pushed: true,
        })
    }

    fn rollback(&self, created: &[String]) -> Result<()> {
        if created.is_empty() {
            return Ok(());
        }
        self.repo.delete_tags(created)
    }
}
