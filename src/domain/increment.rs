use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::commit::{TYPE_FEATURE, TYPE_RELEASE};
use crate::error::GotaggerError;

/// Semantic version increment, ordered from least to most significant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Increment {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl FromStr for Increment {
    type Err = GotaggerError;

    /// Parses `none`, `patch`, `minor` or `major`. The empty string means `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Increment::Major),
            "minor" => Ok(Increment::Minor),
            "patch" => Ok(Increment::Patch),
            "none" | "" => Ok(Increment::None),
            other => Err(GotaggerError::config(format!(
                "invalid version increment '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Increment::None => "none",
            Increment::Patch => "patch",
            Increment::Minor => "minor",
            Increment::Major => "major",
        };
        f.write_str(name)
    }
}

/// Maps commit types to increments.
///
/// `feat` maps to minor unless overridden, every unmapped type falls back to
/// the table default, and `release` is always a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementTable {
    mappings: HashMap<String, Increment>,
    default: Increment,
}

impl IncrementTable {
    /// Build a table from overrides layered on the built-in mappings
    pub fn new(overrides: HashMap<String, Increment>, default: Increment) -> Self {
        let mut mappings = HashMap::from([(TYPE_FEATURE.to_string(), Increment::Minor)]);
        mappings.extend(overrides);
        mappings.remove(TYPE_RELEASE);

        IncrementTable { mappings, default }
    }

    /// Increment for a commit type
    pub fn get(&self, commit_type: &str) -> Increment {
        if commit_type == TYPE_RELEASE {
            return Increment::Patch;
        }

        self.mappings
            .get(commit_type)
            .copied()
            .unwrap_or(self.default)
    }

    pub fn default_increment(&self) -> Increment {
        self.default
    }
}

impl Default for IncrementTable {
    fn default() -> Self {
        IncrementTable::new(HashMap::new(), Increment::Patch)
    }
}
