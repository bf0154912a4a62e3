//! Analysis engine for determining version increments from commits

pub mod version_analyzer;

pub use version_analyzer::{Classification, VersionAnalyzer};
