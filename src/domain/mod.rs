//! Domain logic - pure versioning rules independent of git operations

pub mod commit;
pub mod increment;
pub mod module;
pub mod tag;
pub mod version;

pub use commit::{ChangeAction, Commit, CommitParser, FileChange, Footer, Revert};
pub use increment::{Increment, IncrementTable};
pub use module::{MajorWindow, Module};
pub use tag::TagPrefix;
pub use version::Version;
