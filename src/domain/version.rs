pub use semver::Version;
use semver::{BuildMetadata, Prerelease};

use crate::domain::increment::Increment;

/// Applies a single increment to a version.
///
/// - **Major**: major += 1, minor = 0, patch = 0
/// - **Minor**: minor += 1, patch = 0
/// - **Patch**: patch += 1, or only drop the prerelease of a prerelease version
/// - **None**: unchanged
///
/// Every increment other than `None` clears prerelease and build metadata.
pub fn bump(version: &Version, increment: Increment) -> Version {
    let mut next = version.clone();
    if increment == Increment::None {
        return next;
    }

    let was_prerelease = !next.pre.is_empty() || !next.build.is_empty();
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;

    match increment {
        Increment::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        Increment::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        Increment::Patch => {
            if !was_prerelease {
                next.patch += 1;
            }
        }
        Increment::None => {}
    }
    next
}

/// First version of a major release line (`N.0.0`)
pub fn epoch(major: u64) -> Version {
    Version::new(major, 0, 0)
}
