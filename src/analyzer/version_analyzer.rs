use crate::config::Config;
use crate::domain::version::bump;
use crate::domain::{Commit, Increment, IncrementTable, Version};

/// What a set of commits asks for, before the pre-major rule is applied.
///
/// Combining classifications is associative and commutative, so the result
/// never depends on commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    /// Largest increment requested by a commit type
    pub increment: Increment,
    /// Whether any commit is breaking
    pub breaking: bool,
}

impl Classification {
    pub fn combine(self, other: Classification) -> Classification {
        Classification {
            increment: self.increment.max(other.increment),
            breaking: self.breaking || other.breaking,
        }
    }
}

/// Decides how far a unit's version moves for the commits since its last tag
#[derive(Debug, Clone)]
pub struct VersionAnalyzer {
    table: IncrementTable,
    pre_major: bool,
    dirty_increment: Increment,
}

impl VersionAnalyzer {
    /// Create a new version analyzer.
    ///
    /// A dirty worktree never moves the major version; a major setting is
    /// treated as minor.
    pub fn new(table: IncrementTable, pre_major: bool, dirty_increment: Increment) -> Self {
        VersionAnalyzer {
            table,
            pre_major,
            dirty_increment: dirty_increment.min(Increment::Minor),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.commit_types.clone(),
            config.pre_major,
            config.dirty_worktree_increment,
        )
    }

    /// Classify one commit through the increment table
    pub fn classify_commit(&self, commit: &Commit) -> Classification {
        Classification {
            increment: self.table.get(&commit.r#type),
            breaking: commit.breaking,
        }
    }

    /// Classify a whole commit range
    pub fn classify(&self, commits: &[Commit]) -> Classification {
        commits
            .iter()
            .map(|commit| self.classify_commit(commit))
            .fold(Classification::default(), Classification::combine)
    }

    /// The single increment to apply to `base`.
    ///
    /// With no commits only a dirty worktree moves the version. A breaking
    /// change is a major bump, except for a 0.x base with pre-major set, where
    /// it becomes at least a patch.
    pub fn increment(&self, base: &Version, commits: &[Commit], dirty: bool) -> Increment {
        if commits.is_empty() {
            return if dirty {
                self.dirty_increment
            } else {
                Increment::None
            };
        }

        let classification = self.classify(commits);
        match classification {
            Classification { breaking: true, .. } if self.pre_major && base.major == 0 => {
                classification.increment.max(Increment::Patch)
            }
            Classification { breaking: true, .. } => Increment::Major,
            Classification { increment, .. } => increment,
        }
    }

    /// The version following `base` for the given commits
    pub fn next_version(&self, base: &Version, commits: &[Commit], dirty: bool) -> Version {
        bump(base, self.increment(base, commits, dirty))
    }
}
