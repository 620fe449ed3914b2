use std::path::Path;

use pexl_normalize::PackageName;
use pexl_pep440::VersionSpecifiers;
use pexl_requirement::{DistVersion, Requirement};

use crate::{
    MetadataCache, MetadataError, MetadataFiles, MetadataSource, MetadataType, requires_dists,
    requires_python,
};

/// The fields of a distribution's metadata that packaging decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistMetadata {
    /// The project name as written.
    pub name: String,
    pub project_name: PackageName,
    pub version: DistVersion,
    pub requires_dists: Vec<Requirement>,
    pub requires_python: Option<VersionSpecifiers>,
}

impl DistMetadata {
    pub fn from_metadata_files(
        metadata_files: &MetadataFiles,
        cache: &MetadataCache,
    ) -> Result<Self, MetadataError> {
        let source = MetadataSource::Files(metadata_files);
        Ok(Self {
            name: metadata_files.metadata.name.clone(),
            project_name: metadata_files.metadata.project_name.clone(),
            version: metadata_files.metadata.version.clone(),
            requires_dists: requires_dists(source, cache)?,
            requires_python: requires_python(source, cache)?,
        })
    }

    /// Load the metadata of the single distribution at `location`.
    pub fn load(
        location: &Path,
        restrict_types_to: &[MetadataType],
        cache: &MetadataCache,
    ) -> Result<Self, MetadataError> {
        let metadata_files = cache
            .select(location, None, restrict_types_to, false)?
            .ok_or_else(|| MetadataError::MetadataNotFound(location.to_path_buf()))?;
        Self::from_metadata_files(&metadata_files, cache)
    }
}
