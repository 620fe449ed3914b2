use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tracing::debug;

use pexl_normalize::PackageName;

use crate::{Headers, MetadataError, MetadataFiles, MetadataType, ProjectNameAndVersion};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetadataKey {
    metadata_type: MetadataType,
    location: PathBuf,
}

/// Memoized metadata scans, keyed by location.
///
/// Distribution contents at a path are assumed not to change unless a scan is requested with
/// `rescan` or the location is [invalidated](MetadataCache::invalidate).
#[derive(Debug, Default)]
pub struct MetadataCache {
    metadata_files: Mutex<FxHashMap<MetadataKey, Arc<[MetadataFiles]>>>,
    pkg_info: Mutex<FxHashMap<PathBuf, Option<Headers>>>,
    project_names: Mutex<FxHashMap<PathBuf, ProjectNameAndVersion>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The metadata of one layout found at `location`.
    ///
    /// Repeated calls return the same listing until `rescan` is set, which scans afresh and
    /// replaces the cached listing.
    pub fn listing(
        &self,
        location: &Path,
        metadata_type: MetadataType,
        rescan: bool,
    ) -> Result<Arc<[MetadataFiles]>, MetadataError> {
        let key = MetadataKey {
            metadata_type,
            location: location.to_path_buf(),
        };
        if rescan {
            lock(&self.metadata_files).remove(&key);
            lock(&self.pkg_info).remove(location);
            lock(&self.project_names).remove(location);
        } else if let Some(listing) = lock(&self.metadata_files).get(&key) {
            debug!(
                "Using cached {metadata_type} metadata for: `{}`",
                location.display()
            );
            return Ok(listing.clone());
        }

        debug!("Scanning for {metadata_type} metadata in: `{}`", location.display());
        let listing: Arc<[MetadataFiles]> = metadata_type.finder()(location)?.into();
        lock(&self.metadata_files).insert(key, listing.clone());
        Ok(listing)
    }

    /// All metadata found at `location` for the given layouts, or for every layout if none are
    /// given.
    pub fn locate(
        &self,
        location: &Path,
        restrict_types_to: &[MetadataType],
        rescan: bool,
    ) -> Result<Vec<MetadataFiles>, MetadataError> {
        let metadata_types = if restrict_types_to.is_empty() {
            &MetadataType::ALL[..]
        } else {
            restrict_types_to
        };
        let mut files = Vec::new();
        for metadata_type in metadata_types {
            files.extend(self.listing(location, *metadata_type, rescan)?.iter().cloned());
        }
        Ok(files)
    }

    /// The single set of metadata at `location`, optionally for a given project.
    ///
    /// Finding more than one match is an error.
    pub fn select(
        &self,
        location: &Path,
        project_name: Option<&PackageName>,
        restrict_types_to: &[MetadataType],
        rescan: bool,
    ) -> Result<Option<MetadataFiles>, MetadataError> {
        let mut matches = self
            .locate(location, restrict_types_to, rescan)?
            .into_iter()
            .filter(|files| project_name.is_none_or(|name| *name == files.metadata.project_name))
            .collect::<Vec<_>>();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(MetadataError::AmbiguousDistribution {
                location: location.to_path_buf(),
                rel_paths: matches
                    .into_iter()
                    .map(|files| files.metadata.rel_path)
                    .collect(),
            }),
        }
    }

    /// The primary metadata headers of the distribution at `location`.
    pub fn pkg_info(&self, location: &Path) -> Result<Option<Headers>, MetadataError> {
        if let Some(pkg_info) = lock(&self.pkg_info).get(location) {
            return Ok(pkg_info.clone());
        }
        let pkg_info = self
            .select(location, None, &[], false)?
            .map(|files| files.metadata.headers);
        lock(&self.pkg_info).insert(location.to_path_buf(), pkg_info.clone());
        Ok(pkg_info)
    }

    pub(crate) fn project_name_and_version(
        &self,
        location: &Path,
    ) -> Option<ProjectNameAndVersion> {
        lock(&self.project_names).get(location).cloned()
    }

    pub(crate) fn insert_project_name_and_version(
        &self,
        location: &Path,
        project_name_and_version: ProjectNameAndVersion,
    ) {
        lock(&self.project_names).insert(location.to_path_buf(), project_name_and_version);
    }

    /// Forget everything cached about `location`.
    pub fn invalidate(&self, location: &Path) {
        lock(&self.metadata_files).retain(|key, _| key.location != location);
        lock(&self.pkg_info).remove(location);
        lock(&self.project_names).remove(location);
    }
}

#[cfg(test)]
mod tests;
