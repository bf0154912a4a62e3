use std::fmt;

use tracing::warn;

/// Non-fatal conditions met while resolving versions.
/// They never change the computed result; they are reported through `tracing`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No new commits since the latest tag
    NoNewCommits {
        latest_tag: String,
        current_commit_hash: String,
    },
    /// Tag has the unit's prefix but the rest is not a semantic version
    UnparsableTag { tag: String, reason: String },
    /// Tag parses but its major version is outside the module's major line
    IncompatibleTag { tag: String, module: String },
    /// No new commits, but the worktree has uncommitted changes
    DirtyWorktree { increment: String },
    /// Path filters given for a repository that versions Go modules
    PathsIgnored { paths: Vec<String> },
}

impl BoundaryWarning {
    /// Emit this warning as a `tracing` event
    pub fn emit(&self) {
        warn!("{}", self);
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                latest_tag,
                current_commit_hash,
            } => {
                let short_hash = if current_commit_hash.len() > 7 {
                    &current_commit_hash[..7]
                } else {
                    current_commit_hash.as_str()
                };
                write!(
                    f,
                    "No new commits since tag '{}' (current: {})",
                    latest_tag, short_hash
                )
            }
            BoundaryWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            BoundaryWarning::IncompatibleTag { tag, module } => {
                write!(
                    f,
                    "Tag '{}' is outside the major version of module '{}'",
                    tag, module
                )
            }
            BoundaryWarning::DirtyWorktree { increment } => {
                write!(
                    f,
                    "No new commits but the worktree is dirty; applying a {} increment",
                    increment
                )
            }
            BoundaryWarning::PathsIgnored { paths } => {
                write!(
                    f,
                    "Ignoring path filters ({}) because the repository contains Go modules",
                    paths.join(", ")
                )
            }
        }
    }
}
