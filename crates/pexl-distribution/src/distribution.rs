use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use pexl_metadata::{
    DistMetadata, EntryMap, MetadataCache, MetadataError, MetadataFiles, MetadataSource,
    MetadataType, metadata_lines, parse_entry_map,
};
use pexl_normalize::PackageName;
use pexl_requirement::{Candidate, DistVersion, Requirement};

/// The shape a distribution takes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionType {
    /// An installed distribution in a `site-packages`-style directory.
    Installed,
    Wheel,
    Sdist,
}

impl DistributionType {
    /// Classify `location` by its shape.
    ///
    /// A `.whl` that is not actually a zip archive is treated as an sdist.
    pub fn of(location: &Path) -> Self {
        if location.is_dir() {
            Self::Installed
        } else if location
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("whl"))
            && is_zip(location)
        {
            Self::Wheel
        } else {
            Self::Sdist
        }
    }

    /// The metadata layouts a distribution of this type can carry.
    pub fn metadata_types(self) -> &'static [MetadataType] {
        match self {
            Self::Installed => &[MetadataType::DistInfo, MetadataType::EggInfo],
            Self::Wheel => &[MetadataType::DistInfo],
            Self::Sdist => &[MetadataType::PkgInfo],
        }
    }
}

fn is_zip(location: &Path) -> bool {
    fs_err::File::open(location)
        .ok()
        .is_some_and(|file| zip::ZipArchive::new(file).is_ok())
}

/// A distribution at a location along with its metadata.
#[derive(Debug, Clone)]
pub struct Distribution {
    location: PathBuf,
    metadata: DistMetadata,
    metadata_files: MetadataFiles,
}

impl Distribution {
    /// Load the single distribution at `location`.
    pub fn load(location: &Path, cache: &MetadataCache) -> Result<Self, MetadataError> {
        let location = dunce::canonicalize(location)?;
        let metadata_types = DistributionType::of(&location).metadata_types();
        let metadata_files = cache
            .select(&location, None, metadata_types, false)?
            .ok_or_else(|| MetadataError::MetadataNotFound(location.clone()))?;
        Self::from_metadata_files(location, metadata_files, cache)
    }

    pub(crate) fn from_metadata_files(
        location: PathBuf,
        metadata_files: MetadataFiles,
        cache: &MetadataCache,
    ) -> Result<Self, MetadataError> {
        let metadata = DistMetadata::from_metadata_files(&metadata_files, cache)?;
        Ok(Self {
            location,
            metadata,
            metadata_files,
        })
    }

    /// The canonical location of the directory or archive holding this distribution.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn metadata(&self) -> &DistMetadata {
        &self.metadata
    }

    pub fn metadata_files(&self) -> &MetadataFiles {
        &self.metadata_files
    }

    pub fn distribution_type(&self) -> DistributionType {
        DistributionType::of(&self.location)
    }

    /// The normalized project name as a string.
    pub fn key(&self) -> &str {
        self.metadata.project_name.as_str()
    }

    pub fn project_name(&self) -> &PackageName {
        &self.metadata.project_name
    }

    pub fn version(&self) -> &DistVersion {
        &self.metadata.version
    }

    /// The requirements this distribution declares.
    pub fn requires(&self) -> &[Requirement] {
        &self.metadata.requires_dists
    }

    /// A requirement matching exactly this distribution.
    pub fn as_requirement(&self) -> Requirement {
        Requirement::pinned(&self.metadata.project_name, &self.metadata.version)
    }

    /// Read the metadata file named `name` from next to the primary metadata file.
    pub fn read_metadata_file(&self, name: &str) -> Result<Option<Vec<u8>>, MetadataError> {
        if Path::new(name).is_absolute() || name.starts_with('/') {
            return Err(MetadataError::AbsoluteMetadataFile(name.to_string()));
        }
        self.metadata_files.read(name)
    }

    /// The non-blank, non-comment lines of the metadata file named `name`.
    pub fn metadata_lines(&self, name: &str) -> Result<Vec<String>, MetadataError> {
        Ok(self
            .read_metadata_file(name)?
            .map(|content| metadata_lines(&content))
            .unwrap_or_default())
    }

    /// The entry points this distribution advertises, by group.
    pub fn entry_points(&self) -> Result<EntryMap, MetadataError> {
        match self.read_metadata_file("entry_points.txt")? {
            Some(content) => Ok(parse_entry_map(&content)?),
            None => Ok(EntryMap::new()),
        }
    }
}

impl PartialEq for Distribution {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.metadata == other.metadata
    }
}

impl Eq for Distribution {}

impl Display for Distribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.metadata.name, self.metadata.version.raw())
    }
}

impl<'a> From<&'a Distribution> for Candidate<'a> {
    fn from(distribution: &'a Distribution) -> Self {
        Candidate::Named {
            name: &distribution.metadata.project_name,
            version: &distribution.metadata.version,
        }
    }
}

impl<'a> From<&'a Distribution> for MetadataSource<'a> {
    fn from(distribution: &'a Distribution) -> Self {
        MetadataSource::Distribution(&distribution.metadata)
    }
}
