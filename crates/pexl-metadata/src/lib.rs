//! Distribution metadata: finding it inside installed directories, wheels and source
//! distributions, and reading names, versions, requirements and entry points out of it.

use std::path::PathBuf;

use thiserror::Error;

use pexl_normalize::InvalidNameError;
use pexl_pep440::VersionSpecifiersParseError;
use pexl_requirement::RequirementParseError;

pub use cache::MetadataCache;
pub use dist_metadata::DistMetadata;
pub use entry_points::{EntryMap, EntryPoint, EntryPointError, metadata_lines, parse_entry_map};
pub use fields::{
    legacy_requires_warning, parse_requires_txt, project_name_and_version, requires_dists,
    requires_python,
};
pub use headers::Headers;
pub use locator::{DistMetadataFile, MetadataFiles, MetadataType};
pub use project_name_and_version::ProjectNameAndVersion;
pub use source::MetadataSource;

mod cache;
mod dist_metadata;
mod entry_points;
mod fields;
mod headers;
mod locator;
mod project_name_and_version;
mod source;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Failed to read zip archive: `{}`", .0.display())]
    Zip(PathBuf, #[source] zip::result::ZipError),
    #[error("Invalid glob pattern for metadata discovery")]
    Glob(#[from] glob::PatternError),
    #[error("Failed to parse metadata headers of {0}")]
    MailParse(String, #[source] mailparse::MailParseError),
    #[error(
        "The 'Name' and 'Version' fields are not both present in package metadata for {location}:\n{fields}"
    )]
    MissingNameOrVersion { location: String, fields: String },
    #[error(
        "The distribution at path {0:?} does not have a file name matching known sdist or wheel file name formats."
    )]
    UnrecognizedDistributionFormat(PathBuf),
    #[error("Found more than one distribution inside {}:\n{}", .location.display(), .rel_paths.join("\n"))]
    AmbiguousDistribution {
        location: PathBuf,
        rel_paths: Vec<String>,
    },
    #[error("Failed to determine project name and version for distribution at {}.", .0.display())]
    MetadataNotFound(PathBuf),
    #[error(
        "The metadata file name must be a relative path under the .dist-info/ (or .egg-info/) directory. Given: {0}"
    )]
    AbsoluteMetadataFile(String),
    #[error("Invalid project name in metadata for {location}")]
    InvalidName {
        location: String,
        #[source]
        err: InvalidNameError,
    },
    #[error("Invalid requirement `{requirement}` in metadata for {location}")]
    InvalidRequirement {
        location: String,
        requirement: String,
        #[source]
        err: RequirementParseError,
    },
    #[error("Invalid `Requires-Python` value `{value}` in metadata for {location}")]
    InvalidRequiresPython {
        location: String,
        value: String,
        #[source]
        err: VersionSpecifiersParseError,
    },
    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),
}
