use crate::domain::version::Version;

/// Tag name prefix of one versionable unit: the unit prefix (`bar/`)
/// followed by the version prefix (`v`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPrefix {
    unit: String,
    version: String,
}

impl TagPrefix {
    pub fn new(unit: impl Into<String>, version: impl Into<String>) -> Self {
        TagPrefix {
            unit: unit.into(),
            version: version.into(),
        }
    }

    /// The full prefix every tag of this unit starts with
    pub fn as_string(&self) -> String {
        format!("{}{}", self.unit, self.version)
    }

    /// Whether `tag` belongs to this unit.
    ///
    /// With an empty version prefix the remainder must start with a digit so
    /// that tags using another naming scheme are not picked up.
    pub fn matches(&self, tag: &str) -> bool {
        match self.remainder(tag) {
            Some(rest) if self.version.is_empty() => starts_with_digit(rest),
            Some(_) => true,
            None => false,
        }
    }

    /// Parse the semantic version encoded in `tag`, if it belongs to this unit
    pub fn parse_version(&self, tag: &str) -> Option<Version> {
        if !self.matches(tag) {
            return None;
        }
        self.remainder(tag)
            .and_then(|rest| Version::parse(rest).ok())
    }

    /// Format a version as a tag name of this unit
    pub fn format(&self, version: &Version) -> String {
        format!("{}{}{}", self.unit, self.version, version)
    }

    fn remainder<'a>(&self, tag: &'a str) -> Option<&'a str> {
        tag.strip_prefix(self.unit.as_str())
            .and_then(|rest| rest.strip_prefix(self.version.as_str()))
    }
}

/// Whether a tag name passes a prefix filter.
///
/// An empty filter admits everything. The empty-string prefix admits only
/// tags that start with a digit, i.e. tags with no prefix at all.
pub fn matches_any_prefix(tag: &str, prefixes: &[&str]) -> bool {
    if prefixes.is_empty() {
        return true;
    }

    prefixes.iter().any(|prefix| {
        if prefix.is_empty() {
            starts_with_digit(tag)
        } else {
            tag.starts_with(prefix)
        }
    })
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}
