use std::cmp::Ordering;

use crate::domain::version::{epoch, Version};

/// Path of the repository root
pub const ROOT_PATH: &str = ".";

/// Which major versions a unit's tags may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MajorWindow {
    /// Any major version; used for units that are not Go modules
    Any,
    /// Majors 0 and 1; a module whose name has no `/vN` suffix
    Unversioned,
    /// Exactly the major encoded in the module name
    Exactly(u64),
}

impl MajorWindow {
    pub fn admits(&self, major: u64) -> bool {
        match self {
            MajorWindow::Any => true,
            MajorWindow::Unversioned => major <= 1,
            MajorWindow::Exactly(n) => major == *n,
        }
    }

    /// Version to report when no compatible tag exists yet.
    ///
    /// Only an encoded major has one; other units start from 0.0.0 and
    /// walk their full history.
    pub fn epoch(&self) -> Option<Version> {
        match self {
            MajorWindow::Exactly(n) => Some(epoch(*n)),
            _ => None,
        }
    }
}

/// A versionable unit of the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Module {
    /// Slash-separated directory relative to the repository root, `.` for the root
    pub path: String,
    /// Declared module name
    pub name: String,
    /// Prefix of this unit's tag names, empty for the root
    pub prefix: String,
    pub window: MajorWindow,
}

impl Module {
    /// A Go module, with its tag prefix derived from path and name.
    ///
    /// `encoded_major` is the `N` of a trailing `/vN` in the module name.
    pub fn new(path: impl Into<String>, name: impl Into<String>, encoded_major: Option<u64>) -> Self {
        let path = path.into();
        let prefix = module_prefix(&path, encoded_major);
        let window = encoded_major.map_or(MajorWindow::Unversioned, MajorWindow::Exactly);

        Module {
            path,
            name: name.into(),
            prefix,
            window,
        }
    }

    /// The whole repository as one unit
    pub fn repository_root() -> Self {
        Module {
            path: ROOT_PATH.to_string(),
            name: String::new(),
            prefix: String::new(),
            window: MajorWindow::Any,
        }
    }

    /// A directory of the repository versioned on its own, tagged `<path>/<version>`
    pub fn directory(path: &str) -> Self {
        let path = clean_path(path);
        if path == ROOT_PATH {
            return Module::repository_root();
        }

        Module {
            prefix: format!("{}/", path),
            name: path.clone(),
            path,
            window: MajorWindow::Any,
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }
}

/// Discovery order: shallower paths first, alphabetical among equal length
pub fn compare_paths(a: &Module, b: &Module) -> Ordering {
    a.path
        .len()
        .cmp(&b.path.len())
        .then_with(|| a.path.cmp(&b.path))
}

fn module_prefix(path: &str, encoded_major: Option<u64>) -> String {
    if path == ROOT_PATH {
        return String::new();
    }

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(major) = encoded_major {
        let major_dir = format!("v{}", major);
        if segments.last() == Some(&major_dir.as_str()) {
            segments.pop();
        }
    }

    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

/// Canonical `./dir/` form used for exclude comparisons
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    if !normalized.starts_with("./") && normalized != ROOT_PATH {
        normalized.insert_str(0, "./");
    }
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Slash path without `./` prefix or trailing `/`; the root becomes `.`
pub fn clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parent directory of a slash path; `.` for top-level entries
pub fn parent_dir(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent,
        _ => ROOT_PATH,
    }
}
