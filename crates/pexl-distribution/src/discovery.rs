use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::debug;

use pexl_metadata::{DistMetadataFile, MetadataCache, MetadataError, MetadataType};
use pexl_normalize::PackageName;

use crate::Distribution;

const INSTALLED_METADATA_TYPES: [MetadataType; 2] = [MetadataType::DistInfo, MetadataType::EggInfo];

/// Visit every installed distribution on `search_path` in order until `visit` returns `true`.
///
/// Entries that are not directories are skipped, and a distribution reachable through more than
/// one entry is only visited once.
fn visit_distributions<'a>(
    search_path: impl IntoIterator<Item = &'a Path>,
    cache: &MetadataCache,
    mut visit: impl FnMut(Distribution) -> bool,
) -> Result<(), MetadataError> {
    let mut seen = FxHashSet::<DistMetadataFile>::default();
    for location in search_path {
        if !location.is_dir() {
            debug!("Skipping non-directory search path entry: `{}`", location.display());
            continue;
        }
        let location = dunce::canonicalize(location)?;
        for metadata_files in cache.locate(&location, &INSTALLED_METADATA_TYPES, false)? {
            if !seen.insert(metadata_files.metadata.clone()) {
                continue;
            }
            let distribution =
                Distribution::from_metadata_files(location.clone(), metadata_files, cache)?;
            if visit(distribution) {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// All installed distributions on `search_path`, ordered by search path entry.
pub fn find_distributions<'a>(
    search_path: impl IntoIterator<Item = &'a Path>,
    cache: &MetadataCache,
) -> Result<Vec<Distribution>, MetadataError> {
    let mut distributions = Vec::new();
    visit_distributions(search_path, cache, |distribution| {
        distributions.push(distribution);
        false
    })?;
    Ok(distributions)
}

/// The first installed distribution of `project_name` on `search_path`.
pub fn find_distribution<'a>(
    project_name: &PackageName,
    search_path: impl IntoIterator<Item = &'a Path>,
    cache: &MetadataCache,
) -> Result<Option<Distribution>, MetadataError> {
    let mut found = None;
    visit_distributions(search_path, cache, |distribution| {
        if distribution.project_name() == project_name {
            found = Some(distribution);
            true
        } else {
            false
        }
    })?;
    Ok(found)
}
