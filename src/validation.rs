//! Release commit validation
//!
//! A release commit names the modules it releases in `Modules:` footers. The
//! declared set must match the modules the commit actually changed.

use std::collections::BTreeSet;

use crate::attribution::changed_units;
use crate::domain::{Commit, Module};
use crate::error::{GotaggerError, Result, ValidationError};

/// Footer title listing the modules a release commit releases
pub const MODULES_FOOTER: &str = "Modules";

/// Modules declared by `commit`, in declaration order without duplicates.
///
/// Without a `Modules` footer this is the root module, or the first module
/// when there is no root module.
pub fn declared_modules(commit: &Commit, modules: &[Module]) -> Result<Vec<Module>> {
    let mut declared: Vec<Module> = Vec::new();
    let names = commit
        .footer_texts(MODULES_FOOTER)
        .flat_map(|text| text.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty());

    for name in names {
        let module = modules
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| GotaggerError::module(format!("no module {} found", name)))?;
        if !declared.contains(module) {
            declared.push(module.clone());
        }
    }

    if declared.is_empty() {
        let default = modules.iter().find(|m| m.is_root()).or_else(|| modules.first());
        declared.extend(default.cloned());
    }

    Ok(declared)
}

/// Modules owning at least one file changed by `commit`
pub fn changed_modules(commit: &Commit, modules: &[Module]) -> Vec<Module> {
    changed_units(commit, modules).into_iter().cloned().collect()
}

/// Compare declared and changed modules by name
pub fn validate(declared: &[Module], changed: &[Module]) -> std::result::Result<(), ValidationError> {
    let declared: BTreeSet<&str> = declared.iter().map(|m| m.name.as_str()).collect();
    let changed: BTreeSet<&str> = changed.iter().map(|m| m.name.as_str()).collect();

    let error = ValidationError {
        extra: declared.difference(&changed).map(|s| s.to_string()).collect(),
        missing: changed.difference(&declared).map(|s| s.to_string()).collect(),
    };

    if error.is_empty() {
        Ok(())
    } else {
        Err(error)
    }
}

/// Validate a release commit against the modules it changed
pub fn validate_release(commit: &Commit, declared: &[Module], modules: &[Module]) -> Result<()> {
    validate(declared, &changed_modules(commit, modules))?;
    Ok(())
}
