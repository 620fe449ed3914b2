use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use pexl_normalize::PackageName;
use pexl_requirement::DistVersion;

use crate::{Headers, MetadataError, ProjectNameAndVersion};

/// The metadata layouts a distribution may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataType {
    /// `*.dist-info/METADATA`, in installed directories and wheels.
    DistInfo,
    /// `*.egg-info/PKG-INFO`, in installed directories.
    EggInfo,
    /// `<name>-<version>/PKG-INFO`, at the root of a source distribution.
    PkgInfo,
}

impl MetadataType {
    pub const ALL: [Self; 3] = [Self::DistInfo, Self::EggInfo, Self::PkgInfo];

    /// The discovery routine for this layout.
    pub(crate) fn finder(self) -> fn(&Path) -> Result<Vec<MetadataFiles>, MetadataError> {
        match self {
            Self::DistInfo => find_dist_info_metadata,
            Self::EggInfo => find_egg_info_metadata,
            Self::PkgInfo => find_sdist_metadata,
        }
    }
}

impl Display for MetadataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::DistInfo => ".dist-info",
            Self::EggInfo => ".egg-info",
            Self::PkgInfo => "PKG-INFO",
        })
    }
}

/// The primary metadata file of a distribution.
///
/// Equality and hashing ignore the parsed headers, which are fully determined by the file.
#[derive(Debug, Clone)]
pub struct DistMetadataFile {
    pub metadata_type: MetadataType,
    /// The directory or archive containing the distribution.
    pub location: PathBuf,
    /// The path of the metadata file relative to `location`.
    pub rel_path: String,
    /// The project name as written in the metadata.
    pub name: String,
    pub project_name: PackageName,
    pub version: DistVersion,
    pub headers: Headers,
}

impl DistMetadataFile {
    fn new(
        metadata_type: MetadataType,
        location: &Path,
        rel_path: String,
        headers: Headers,
    ) -> Result<Self, MetadataError> {
        let source = location.join(&rel_path).display().to_string();
        let project_name_and_version = ProjectNameAndVersion::from_headers(&source, &headers)?;
        Ok(Self {
            metadata_type,
            location: location.to_path_buf(),
            rel_path,
            name: project_name_and_version.project_name().to_string(),
            project_name: project_name_and_version.canonicalized_project_name().clone(),
            version: project_name_and_version.canonicalized_version().clone(),
            headers,
        })
    }

    fn parse(
        metadata_type: MetadataType,
        location: &Path,
        rel_path: String,
        content: &[u8],
    ) -> Result<Self, MetadataError> {
        let headers = Headers::parse(content).map_err(|err| {
            MetadataError::MailParse(location.join(&rel_path).display().to_string(), err)
        })?;
        Self::new(metadata_type, location, rel_path, headers)
    }
}

impl PartialEq for DistMetadataFile {
    fn eq(&self, other: &Self) -> bool {
        self.metadata_type == other.metadata_type
            && self.location == other.location
            && self.rel_path == other.rel_path
            && self.project_name == other.project_name
            && self.version == other.version
    }
}

impl Eq for DistMetadataFile {}

impl Hash for DistMetadataFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata_type.hash(state);
        self.location.hash(state);
        self.rel_path.hash(state);
        self.project_name.hash(state);
        self.version.hash(state);
    }
}

/// How sibling metadata files are read back.
#[derive(Debug, Clone)]
enum MetadataReader {
    /// Relative paths under an installed directory.
    Directory(PathBuf),
    /// Entry names inside a wheel.
    Zip(PathBuf),
}

impl MetadataReader {
    fn read(&self, rel_path: &str) -> Result<Vec<u8>, MetadataError> {
        match self {
            Self::Directory(location) => Ok(fs_err::read(location.join(rel_path))?),
            Self::Zip(location) => read_zip_entry(&mut open_zip(location)?, location, rel_path),
        }
    }
}

/// One set of metadata found at a location: the primary metadata file and its siblings.
#[derive(Debug, Clone)]
pub struct MetadataFiles {
    pub metadata: DistMetadataFile,
    additional_metadata_files: Vec<String>,
    reader: Option<MetadataReader>,
}

impl MetadataFiles {
    /// Metadata without readable siblings, as for source distributions.
    pub fn new(metadata: DistMetadataFile) -> Self {
        Self {
            metadata,
            additional_metadata_files: Vec::new(),
            reader: None,
        }
    }

    /// The relative paths of the files next to the primary metadata file.
    pub fn additional_metadata_files(&self) -> &[String] {
        &self.additional_metadata_files
    }

    /// The relative path of the sibling file named exactly `metadata_file_name`.
    pub fn metadata_file_rel_path(&self, metadata_file_name: &str) -> Option<&str> {
        self.additional_metadata_files
            .iter()
            .map(String::as_str)
            .find(|rel_path| basename(rel_path) == metadata_file_name)
    }

    /// Read the sibling file named `metadata_file_name`, if there is one.
    pub fn read(&self, metadata_file_name: &str) -> Result<Option<Vec<u8>>, MetadataError> {
        let (Some(rel_path), Some(reader)) = (
            self.metadata_file_rel_path(metadata_file_name),
            &self.reader,
        ) else {
            return Ok(None);
        };
        reader.read(rel_path).map(Some)
    }
}

fn basename(rel_path: &str) -> &str {
    rel_path
        .rsplit(['/', std::path::MAIN_SEPARATOR])
        .next()
        .unwrap_or(rel_path)
}

fn file_name_ends_with(location: &Path, suffixes: &[&str]) -> bool {
    location
        .file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)))
}

fn find_dist_info_metadata(location: &Path) -> Result<Vec<MetadataFiles>, MetadataError> {
    if location.is_dir() {
        find_installed_metadata_files(location, MetadataType::DistInfo, "*.dist-info", "METADATA")
    } else if file_name_ends_with(location, &[".whl"]) {
        Ok(find_wheel_metadata(location)?.into_iter().collect())
    } else {
        Ok(Vec::new())
    }
}

fn find_egg_info_metadata(location: &Path) -> Result<Vec<MetadataFiles>, MetadataError> {
    if location.is_dir() {
        find_installed_metadata_files(location, MetadataType::EggInfo, "*.egg-info", "PKG-INFO")
    } else {
        Ok(Vec::new())
    }
}

fn find_sdist_metadata(location: &Path) -> Result<Vec<MetadataFiles>, MetadataError> {
    let metadata_file = if file_name_ends_with(location, &[".zip"]) {
        find_zip_sdist_metadata(location)?
    } else if let Some(compression) = TarCompression::from_path(location) {
        find_tar_sdist_metadata(location, compression)?
    } else {
        None
    };
    Ok(metadata_file.into_iter().map(MetadataFiles::new).collect())
}

/// Find `<location>/<metadata_dir_glob>/<metadata_file_name>` files in an installed directory.
fn find_installed_metadata_files(
    location: &Path,
    metadata_type: MetadataType,
    metadata_dir_glob: &str,
    metadata_file_name: &str,
) -> Result<Vec<MetadataFiles>, MetadataError> {
    let pattern = format!(
        "{}/{metadata_dir_glob}/{metadata_file_name}",
        glob::Pattern::escape(&location.to_string_lossy())
    );

    let mut listing = Vec::new();
    for path in glob::glob(&pattern)? {
        let path = path.map_err(glob::GlobError::into_error)?;
        trace!("Found installed metadata file: `{}`", path.display());
        let rel_path = relative(&path, location);
        let metadata = DistMetadataFile::parse(
            metadata_type,
            location,
            rel_path,
            &fs_err::read(&path)?,
        )?;

        let mut additional_metadata_files = Vec::new();
        if let Some(metadata_dir) = path.parent() {
            for entry in fs_err::read_dir(metadata_dir)? {
                let entry = entry?;
                if entry.file_name() == metadata_file_name || !entry.file_type()?.is_file() {
                    continue;
                }
                additional_metadata_files.push(relative(&entry.path(), location));
            }
        }
        additional_metadata_files.sort();

        listing.push(MetadataFiles {
            metadata,
            additional_metadata_files,
            reader: Some(MetadataReader::Directory(location.to_path_buf())),
        });
    }
    Ok(listing)
}

fn relative(path: &Path, location: &Path) -> String {
    path.strip_prefix(location)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Open a zip archive, or `None` if the file is not one.
fn try_open_zip(location: &Path) -> Result<Option<zip::ZipArchive<fs_err::File>>, MetadataError> {
    if !location.is_file() {
        return Ok(None);
    }
    match zip::ZipArchive::new(fs_err::File::open(location)?) {
        Ok(archive) => Ok(Some(archive)),
        Err(err) => {
            debug!("Not a zip archive: `{}` ({err})", location.display());
            Ok(None)
        }
    }
}

fn open_zip(location: &Path) -> Result<zip::ZipArchive<fs_err::File>, MetadataError> {
    zip::ZipArchive::new(fs_err::File::open(location)?)
        .map_err(|err| MetadataError::Zip(location.to_path_buf(), err))
}

fn read_zip_entry(
    archive: &mut zip::ZipArchive<fs_err::File>,
    location: &Path,
    name: &str,
) -> Result<Vec<u8>, MetadataError> {
    let mut file = archive
        .by_name(name)
        .map_err(|err| MetadataError::Zip(location.to_path_buf(), err))?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(content)
}

/// Find the `<name>.dist-info/METADATA` at the root of a wheel.
fn find_wheel_metadata(location: &Path) -> Result<Option<MetadataFiles>, MetadataError> {
    let Some(mut archive) = try_open_zip(location)? else {
        return Ok(None);
    };
    let names = archive
        .file_names()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    for name in &names {
        trace!("Considering wheel entry: `{name}`");
        if name.ends_with('/') {
            continue;
        }
        let Some((dist_info_dir, "METADATA")) = name.rsplit_once('/') else {
            continue;
        };
        if dist_info_dir.contains('/') || !dist_info_dir.ends_with(".dist-info") {
            continue;
        }

        let content = read_zip_entry(&mut archive, location, name)?;
        let metadata =
            DistMetadataFile::parse(MetadataType::DistInfo, location, name.clone(), &content)?;
        let additional_metadata_files = names
            .iter()
            .filter(|rel_path| {
                rel_path
                    .rsplit_once('/')
                    .is_some_and(|(head, tail)| head == dist_info_dir && tail != "METADATA")
            })
            .cloned()
            .collect();
        return Ok(Some(MetadataFiles {
            metadata,
            additional_metadata_files,
            reader: Some(MetadataReader::Zip(location.to_path_buf())),
        }));
    }
    Ok(None)
}

/// Whether `file_path` is `<project name>-<version>/PKG-INFO`.
fn is_dist_pkg_info_file_path(file_path: &str) -> bool {
    let Some((project_dir, metadata_file)) = file_path.rsplit_once('/') else {
        return false;
    };
    !project_dir.contains('/') && project_dir.contains('-') && metadata_file == "PKG-INFO"
}

fn find_zip_sdist_metadata(location: &Path) -> Result<Option<DistMetadataFile>, MetadataError> {
    let Some(mut archive) = try_open_zip(location)? else {
        return Ok(None);
    };
    let name = archive
        .file_names()
        .find(|name| !name.ends_with('/') && is_dist_pkg_info_file_path(name))
        .map(ToString::to_string);
    let Some(name) = name else {
        return Ok(None);
    };
    trace!("Found sdist metadata entry: `{name}`");
    let content = read_zip_entry(&mut archive, location, &name)?;
    DistMetadataFile::parse(MetadataType::PkgInfo, location, name, &content).map(Some)
}

#[derive(Debug, Clone, Copy)]
enum TarCompression {
    Gzip,
    Bzip2,
    Xz,
}

impl TarCompression {
    fn from_path(location: &Path) -> Option<Self> {
        if file_name_ends_with(location, &[".tar.gz", ".tgz"]) {
            Some(Self::Gzip)
        } else if file_name_ends_with(location, &[".tar.bz2", ".tbz2"]) {
            Some(Self::Bzip2)
        } else if file_name_ends_with(location, &[".tar.xz", ".txz"]) {
            Some(Self::Xz)
        } else {
            None
        }
    }

    fn decoder(self, file: fs_err::File) -> Box<dyn Read> {
        match self {
            Self::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
            Self::Bzip2 => Box::new(bzip2::read::BzDecoder::new(file)),
            Self::Xz => Box::new(xz2::read::XzDecoder::new(file)),
        }
    }
}

fn find_tar_sdist_metadata(
    location: &Path,
    compression: TarCompression,
) -> Result<Option<DistMetadataFile>, MetadataError> {
    if !location.is_file() {
        return Ok(None);
    }
    let mut archive = tar::Archive::new(compression.decoder(fs_err::File::open(location)?));
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Not a tar archive: `{}` ({err})", location.display());
            return Ok(None);
        }
    };

    let mut first = true;
    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            // A failure on the very first header means this is not a tarball at all.
            Err(err) if first => {
                debug!("Not a tar archive: `{}` ({err})", location.display());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        first = false;

        let name = entry.path()?.to_string_lossy().into_owned();
        trace!("Considering sdist entry: `{name}`");
        if !entry.header().entry_type().is_file() || !is_dist_pkg_info_file_path(&name) {
            continue;
        }
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        return DistMetadataFile::parse(MetadataType::PkgInfo, location, name, &content).map(Some);
    }
    Ok(None)
}
