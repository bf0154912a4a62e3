//! File-to-unit attribution
//!
//! A changed file belongs to the deepest unit whose directory encloses it.
//! Files outside every unit belong to nobody; the root only claims files when
//! it is a unit itself.

use std::collections::HashMap;

use crate::domain::module::{parent_dir, ROOT_PATH};
use crate::domain::{Commit, Module};

/// The unit owning `file`, walking up from its parent directory
pub fn owning_unit<'a>(file: &str, units: &'a [Module]) -> Option<&'a Module> {
    if file.is_empty() {
        return None;
    }

    let by_path: HashMap<&str, &Module> = units.iter().map(|u| (u.path.as_str(), u)).collect();
    let mut dir = parent_dir(file);
    loop {
        if let Some(unit) = by_path.get(dir) {
            return Some(unit);
        }
        if dir == ROOT_PATH {
            return None;
        }
        dir = parent_dir(dir);
    }
}

/// Units touched by a commit's own changes, in `units` order.
///
/// Both sides of a rename or copy count.
pub fn changed_units<'a>(commit: &Commit, units: &'a [Module]) -> Vec<&'a Module> {
    let mut changed: Vec<&Module> = Vec::new();
    for file in commit.changes.iter().flat_map(|change| change.paths()) {
        if let Some(unit) = owning_unit(file, units) {
            if !changed.contains(&unit) {
                changed.push(unit);
            }
        }
    }

    changed.sort_by_key(|unit| units.iter().position(|u| u == *unit));
    changed
}

/// Commits with at least one change attributed to `unit`
pub fn filter_commits_for_unit(unit: &Module, commits: Vec<Commit>, universe: &[Module]) -> Vec<Commit> {
    if universe.len() <= 1 {
        return commits;
    }

    commits
        .into_iter()
        .filter(|commit| {
            commit
                .changes
                .iter()
                .flat_map(|change| change.paths())
                .any(|file| owning_unit(file, universe) == Some(unit))
        })
        .collect()
}
