use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::domain::commit::TYPE_RELEASE;
use crate::domain::{Increment, IncrementTable};
use crate::error::{GotaggerError, Result};

/// Name of the configuration file looked up at the repository root
pub const CONFIG_FILE_NAME: &str = "gotagger.json";

/// Represents how to version and tag a repository.
///
/// Options not listed in [Config::default] start out empty or disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Create tags when HEAD is a release commit
    pub create_tag: bool,

    /// Module names or path prefixes to leave out of discovery
    pub exclude_modules: Vec<String>,

    /// Version the repository as a whole even when it contains go.mod files
    pub ignore_modules: bool,

    /// Remote that tags are pushed to
    pub remote_name: String,

    /// Keep breaking changes from moving a 0.x version to 1.0.0
    pub pre_major: bool,

    /// Push created tags to the remote
    pub push_tag: bool,

    /// Prefix between the unit prefix and the version, `v` by default
    pub version_prefix: String,

    /// How to increment when there are no new commits but the worktree is dirty
    pub dirty_worktree_increment: Increment,

    /// Increment for each commit type
    pub commit_types: IncrementTable,

    /// Create tags even if HEAD is not a release commit
    pub force: bool,

    /// Sub-paths versioned independently when the repository has no modules
    pub paths: Vec<String>,

    /// Create signed tags
    pub sign_tags: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            create_tag: false,
            exclude_modules: Vec::new(),
            ignore_modules: false,
            remote_name: "origin".to_string(),
            pre_major: false,
            push_tag: false,
            version_prefix: "v".to_string(),
            dirty_worktree_increment: Increment::None,
            commit_types: IncrementTable::default(),
            force: false,
            paths: Vec::new(),
            sign_tags: false,
        }
    }
}

/// On-disk form of the configuration file.
///
/// `versionPrefix` is optional so that an explicit `""` can be told apart
/// from an absent key.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FileConfig {
    default_increment: String,
    increment_dirty_worktree: String,
    exclude_modules: Vec<String>,
    ignore_modules: bool,
    increment_mappings: HashMap<String, String>,
    increment_pre_release_minor: bool,
    version_prefix: Option<String>,
}

impl Config {
    /// Apply a JSON configuration document.
    ///
    /// The whole document is validated first; on error `self` is unchanged.
    pub fn apply_json(&mut self, data: &str) -> Result<()> {
        let file: FileConfig = serde_json::from_str(data)?;

        let dirty = parse_dirty_increment(&file.increment_dirty_worktree)?;

        if file.increment_mappings.contains_key(TYPE_RELEASE) {
            return Err(GotaggerError::config("release mapping is not allowed"));
        }

        let mut mappings = HashMap::with_capacity(file.increment_mappings.len());
        for (commit_type, increment) in &file.increment_mappings {
            let increment: Increment = increment.parse()?;
            if increment == Increment::Major {
                return Err(GotaggerError::config(
                    "major version increments cannot be mapped to commit types. mark the commit as breaking instead",
                ));
            }
            mappings.insert(commit_type.clone(), increment);
        }

        let default_increment = if file.default_increment.is_empty() {
            Increment::Patch
        } else {
            file.default_increment.parse()?
        };

        self.dirty_worktree_increment = dirty;
        if let Some(prefix) = file.version_prefix {
            self.version_prefix = prefix;
        }
        self.commit_types = IncrementTable::new(mappings, default_increment);
        self.exclude_modules = file.exclude_modules;
        self.ignore_modules = file.ignore_modules;
        self.pre_major = file.increment_pre_release_minor;

        Ok(())
    }
}

/// Parse a dirty worktree increment; `major` is rejected
pub fn parse_dirty_increment(value: &str) -> Result<Increment> {
    let increment: Increment = value.parse().map_err(|_| {
        GotaggerError::config(format!("invalid dirty worktree increment: {}", value))
    })?;
    if increment == Increment::Major {
        return Err(GotaggerError::config(
            "major version increments are not allowed for dirty worktrees",
        ));
    }
    Ok(increment)
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. `explicit_path`, which must exist when given
/// 2. `gotagger.json` in the repository root
/// 3. Default configuration if no file found
pub fn load_config(repo_root: &Path, explicit_path: Option<&Path>) -> Result<Config> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = repo_root.join(CONFIG_FILE_NAME);
            if !path.is_file() {
                debug!(root = %repo_root.display(), "no configuration file, using defaults");
                return Ok(Config::default());
            }
            path
        }
    };

    let data = fs::read_to_string(&path).map_err(|e| {
        GotaggerError::config(format!("could not read {}: {}", path.display(), e))
    })?;

    let mut config = Config::default();
    config.apply_json(&data)?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
