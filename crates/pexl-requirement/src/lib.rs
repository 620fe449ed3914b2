pub use dist_version::{DistVersion, VersionKey};
pub use requirement::{Candidate, Requirement, RequirementParseError};

mod dist_version;
mod requirement;
