use std::fmt;

use thiserror::Error;

/// Unified error type for gotagger operations
#[derive(Error, Debug)]
pub enum GotaggerError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Module error: {0}")]
    Module(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not fetch commits HEAD..{rev}: {source}")]
    RevList {
        rev: String,
        #[source]
        source: Box<GotaggerError>,
    },

    /// A failure that triggered a rollback which itself failed.
    #[error("{source}\n{cleanup}")]
    Rollback {
        #[source]
        source: Box<GotaggerError>,
        cleanup: Box<GotaggerError>,
    },

    #[error("could not delete tags:{}", .0.iter().map(|e| format!("\n\t{e}")).collect::<String>())]
    TagCleanup(Vec<String>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Convenience type alias for Results in gotagger
pub type Result<T> = std::result::Result<T, GotaggerError>;

impl GotaggerError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GotaggerError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        GotaggerError::Version(msg.into())
    }

    /// Create a module error with context
    pub fn module(msg: impl Into<String>) -> Self {
        GotaggerError::Module(msg.into())
    }

    /// Create a repository error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        GotaggerError::Repository(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        GotaggerError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        GotaggerError::Remote(msg.into())
    }

    /// Wrap a commit listing failure with the range that was requested
    pub fn rev_list(rev: impl Into<String>, source: GotaggerError) -> Self {
        GotaggerError::RevList {
            rev: rev.into(),
            source: Box::new(source),
        }
    }

    /// Attach a cleanup failure to the error that caused the cleanup.
    /// A successful cleanup leaves the original error untouched.
    pub fn with_cleanup(self, cleanup: Result<()>) -> Self {
        match cleanup {
            Ok(()) => self,
            Err(cleanup) => GotaggerError::Rollback {
                source: Box::new(self),
                cleanup: Box::new(cleanup),
            },
        }
    }
}

/// A release commit whose `Modules` footers disagree with the modules it changed.
///
/// Both lists are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    /// Modules declared by the commit but not changed by it
    pub extra: Vec<String>,
    /// Modules changed by the commit but not declared
    pub missing: Vec<String>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module validation failed:")?;
        if !self.extra.is_empty() {
            write!(f, "\nmodules not changed by commit: {}", self.extra.join(", "))?;
        }
        if !self.missing.is_empty() {
            write!(
                f,
                "\nchanged modules not released by commit: {}",
                self.missing.join(", ")
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
