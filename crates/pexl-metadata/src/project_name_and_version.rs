use std::path::Path;

use pexl_normalize::{InvalidNameError, PackageName};
use pexl_requirement::{Candidate, DistVersion};

use crate::{Headers, MetadataError};

const SDIST_SUFFIXES: [&str; 7] = [
    ".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar.xz", ".txz", ".zip",
];

/// A project name and version as written, along with their canonical forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectNameAndVersion {
    project_name: String,
    version: String,
    canonicalized_project_name: PackageName,
    canonicalized_version: DistVersion,
}

impl ProjectNameAndVersion {
    pub fn new(
        project_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, InvalidNameError> {
        let project_name = project_name.into();
        let version = version.into();
        let canonicalized_project_name = PackageName::new(&project_name)?;
        let canonicalized_version = DistVersion::new(version.clone());
        Ok(Self {
            project_name,
            version,
            canonicalized_project_name,
            canonicalized_version,
        })
    }

    /// Read the `Name` and `Version` fields, both of which must be present.
    pub fn from_headers(location: &str, headers: &Headers) -> Result<Self, MetadataError> {
        let (Some(project_name), Some(version)) = (
            headers.get_first_value("Name"),
            headers.get_first_value("Version"),
        ) else {
            let fields = headers
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(MetadataError::MissingNameOrVersion {
                location: location.to_string(),
                fields,
            });
        };
        Self::new(project_name, version).map_err(|err| MetadataError::InvalidName {
            location: location.to_string(),
            err,
        })
    }

    /// Infer the project name and version from a wheel or sdist file name.
    ///
    /// Wheels follow <https://peps.python.org/pep-0427/#file-name-convention>. Sdist names split
    /// on the last `-` once the archive suffix is removed, which misreads versions that contain a
    /// `-` in un-normalized form.
    pub fn from_filename(path: &Path) -> Result<Self, MetadataError> {
        let unrecognized = || MetadataError::UnrecognizedDistributionFormat(path.to_path_buf());
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .ok_or_else(unrecognized)?;

        let (project_name, version) = if filename.ends_with(".whl") {
            let mut components = filename.splitn(3, '-');
            match (components.next(), components.next(), components.next()) {
                (Some(project_name), Some(version), Some(_)) => (project_name, version),
                _ => return Err(unrecognized()),
            }
        } else {
            let stem = SDIST_SUFFIXES
                .iter()
                .find_map(|suffix| filename.strip_suffix(suffix))
                .ok_or_else(unrecognized)?;
            stem.rsplit_once('-').ok_or_else(unrecognized)?
        };
        Self::new(project_name, version).map_err(|err| MetadataError::InvalidName {
            location: path.display().to_string(),
            err,
        })
    }

    /// The project name as written.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// The version as written.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn canonicalized_project_name(&self) -> &PackageName {
        &self.canonicalized_project_name
    }

    pub fn canonicalized_version(&self) -> &DistVersion {
        &self.canonicalized_version
    }
}

impl<'a> From<&'a ProjectNameAndVersion> for Candidate<'a> {
    fn from(value: &'a ProjectNameAndVersion) -> Self {
        Candidate::Named {
            name: &value.canonicalized_project_name,
            version: &value.canonicalized_version,
        }
    }
}
