//! Go module discovery
//!
//! Walks the working tree depth-first and turns every `go.mod` that declares a
//! module path into a [Module]. Hidden directories, directories starting with
//! `_` and `testdata` directories are never entered.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::domain::module::{compare_paths, normalize_path, ROOT_PATH};
use crate::domain::Module;
use crate::error::Result;

const GO_MOD: &str = "go.mod";

/// What the walk does with one directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkDecision {
    /// Enter a directory
    Descend,
    /// Prune a directory and everything below it
    SkipSubtree,
    /// Look at a file
    Inspect,
}

fn decide(entry: &DirEntry) -> WalkDecision {
    if !entry.file_type().is_dir() {
        return WalkDecision::Inspect;
    }
    if entry.depth() == 0 {
        return WalkDecision::Descend;
    }

    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name.starts_with('_') || name == "testdata" {
        WalkDecision::SkipSubtree
    } else {
        WalkDecision::Descend
    }
}

/// Which discovered modules to keep
#[derive(Debug, Clone, Default)]
pub struct ModuleFilter {
    include: HashSet<String>,
    exclude_names: HashSet<String>,
    exclude_paths: Vec<String>,
}

impl ModuleFilter {
    /// Keep only the named modules; an empty list keeps everything
    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = names.into_iter().map(Into::into).collect();
        self
    }

    /// Drop modules by name, or by path when an entry is a path prefix.
    ///
    /// Every entry is tried both ways, so `bar` excludes a module named `bar`
    /// as well as every module under the `bar/` directory.
    pub fn exclude<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in entries {
            let entry = entry.as_ref();
            self.exclude_names.insert(entry.to_string());
            self.exclude_paths.push(normalize_path(entry));
        }
        self
    }

    fn admits(&self, name: &str, path: &str) -> bool {
        if !self.include.is_empty() && !self.include.contains(name) {
            return false;
        }
        if self.exclude_names.contains(name) {
            return false;
        }

        let normalized = normalize_path(path);
        !self
            .exclude_paths
            .iter()
            .any(|exclude| normalized.starts_with(exclude.as_str()))
    }
}

/// Finds Go modules below a repository root
pub struct ModuleFinder {
    module_directive: Regex,
    major_suffix: Regex,
}

impl ModuleFinder {
    pub fn new() -> Result<Self> {
        Ok(ModuleFinder {
            module_directive: Regex::new(r#"(?m)^\s*module\s+["`]?([^"`\s]+)["`]?\s*(?://.*)?$"#)?,
            major_suffix: Regex::new(r"/v(\d+)$")?,
        })
    }

    /// All modules under `root` admitted by `filter`, shallowest path first
    pub fn find_all_modules(&self, root: &Path, filter: &ModuleFilter) -> Result<Vec<Module>> {
        let mut modules = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| decide(entry) != WalkDecision::SkipSubtree);

        for entry in walker {
            let entry = entry?;
            if decide(&entry) != WalkDecision::Inspect || entry.file_name() != GO_MOD {
                continue;
            }

            let contents = fs::read(entry.path())?;
            let Some(name) = self.module_name(&String::from_utf8_lossy(&contents)) else {
                debug!(path = %entry.path().display(), "go.mod declares no module path");
                continue;
            };

            let path = module_dir(root, entry.path());
            if !filter.admits(&name, &path) {
                debug!(module = %name, path = %path, "module filtered out");
                continue;
            }

            let major = self.encoded_major(&name);
            modules.push(Module::new(path, name, major));
        }

        modules.sort_by(compare_paths);
        debug!(count = modules.len(), root = %root.display(), "discovered modules");
        Ok(modules)
    }

    /// Module path declared by a go.mod file
    pub fn module_name(&self, contents: &str) -> Option<String> {
        self.module_directive
            .captures(contents)
            .map(|caps| caps[1].to_string())
            .filter(|name| !name.is_empty())
    }

    /// The `N` of a trailing `/vN` in a module name
    pub fn encoded_major(&self, name: &str) -> Option<u64> {
        self.major_suffix
            .captures(name)
            .and_then(|caps| caps[1].parse().ok())
    }
}

/// Slash path of the directory holding `go_mod`, relative to `root`
fn module_dir(root: &Path, go_mod: &Path) -> String {
    let dir = go_mod
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    if dir.is_empty() {
        ROOT_PATH.to_string()
    } else {
        dir
    }
}
