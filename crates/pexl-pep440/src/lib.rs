//! Python version numbers and version specifiers, implementing
//! [PEP 440](https://peps.python.org/pep-0440).
//!
//! PEP 440 has a few unintuitive corners that callers should keep in mind:
//!
//! * Ordering contradicts matching: `1.0+local > 1.0` when sorting, but `==1.0` matches
//!   `1.0+local`.
//! * A dev release attached to a final release sorts before all of that release's pre-releases.
//! * Pre-releases are excluded from specifier matching unless the specifier itself names a
//!   pre-release or the caller opts in, see [`VersionSpecifiers::contains_with_prereleases`].
//! * Arbitrary equality (`===`) compares strings, not versions, and so admits versions that do
//!   not parse under PEP 440 at all.

pub use operator::{Operator, OperatorParseError};
pub use version::{LocalSegment, Prerelease, PrereleaseKind, Version, VersionParseError};
pub use version_specifier::{VersionSpecifier, VersionSpecifierParseError};
pub use version_specifiers::{VersionSpecifiers, VersionSpecifiersParseError};

mod operator;
mod version;
mod version_specifier;
mod version_specifiers;
