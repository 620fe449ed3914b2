use std::str::FromStr;

use tracing::debug;

use pexl_pep440::VersionSpecifiers;
use pexl_requirement::Requirement;
use pexl_warnings::warn_user_once;

use crate::{MetadataCache, MetadataError, MetadataSource, MetadataType, ProjectNameAndVersion};

/// The project name and version of a distribution.
///
/// When `source` is a path without metadata and `fallback_to_filename` is set, they are inferred
/// from the file name instead.
pub fn project_name_and_version(
    source: MetadataSource,
    fallback_to_filename: bool,
    cache: &MetadataCache,
) -> Result<Option<ProjectNameAndVersion>, MetadataError> {
    let location = match source {
        MetadataSource::Distribution(metadata) => {
            return ProjectNameAndVersion::new(&metadata.name, metadata.version.raw())
                .map(Some)
                .map_err(|err| MetadataError::InvalidName {
                    location: source.to_string(),
                    err,
                });
        }
        MetadataSource::Files(files) => {
            return ProjectNameAndVersion::new(&files.metadata.name, files.metadata.version.raw())
                .map(Some)
                .map_err(|err| MetadataError::InvalidName {
                    location: source.to_string(),
                    err,
                });
        }
        MetadataSource::Headers(headers) => {
            return ProjectNameAndVersion::from_headers(&source.to_string(), headers).map(Some);
        }
        MetadataSource::Path(location) => location,
    };

    if let Some(project_name_and_version) = cache.project_name_and_version(location) {
        return Ok(Some(project_name_and_version));
    }
    let project_name_and_version = match cache.pkg_info(location)? {
        Some(headers) => ProjectNameAndVersion::from_headers(&source.to_string(), &headers)?,
        None if fallback_to_filename => {
            debug!(
                "No metadata found, using the file name of: `{}`",
                location.display()
            );
            ProjectNameAndVersion::from_filename(location)?
        }
        None => return Ok(None),
    };
    cache.insert_project_name_and_version(location, project_name_and_version.clone());
    Ok(Some(project_name_and_version))
}

/// The `Requires-Python` constraint of a distribution, if it declares one.
pub fn requires_python(
    source: MetadataSource,
    cache: &MetadataCache,
) -> Result<Option<VersionSpecifiers>, MetadataError> {
    if let MetadataSource::Distribution(metadata) = source {
        return Ok(metadata.requires_python.clone());
    }
    let Some(headers) = source.headers(cache)? else {
        return Ok(None);
    };
    let Some(value) = headers.get_first_value("Requires-Python") else {
        return Ok(None);
    };
    VersionSpecifiers::from_str(value)
        .map(Some)
        .map_err(|err| MetadataError::InvalidRequiresPython {
            location: source.to_string(),
            value: value.to_string(),
            err,
        })
}

/// The requirements a distribution declares.
///
/// `Requires-Dist` fields are preferred. Egg-info metadata without them falls back to the
/// `requires.txt` and `depends.txt` sibling files. Legacy `Requires` fields are ignored with a
/// warning.
pub fn requires_dists(
    source: MetadataSource,
    cache: &MetadataCache,
) -> Result<Vec<Requirement>, MetadataError> {
    if let MetadataSource::Distribution(metadata) = source {
        return Ok(metadata.requires_dists.clone());
    }
    let Some(headers) = source.headers(cache)? else {
        return Ok(Vec::new());
    };

    let mut requirements = Vec::new();
    let declared = headers.get_all_values("Requires-Dist").collect::<Vec<_>>();
    match source {
        MetadataSource::Files(files)
            if declared.is_empty() && files.metadata.metadata_type == MetadataType::EggInfo =>
        {
            for metadata_file in ["requires.txt", "depends.txt"] {
                if let Some(content) = files.read(metadata_file)? {
                    let location = format!("{source} ({metadata_file})");
                    requirements.extend(parse_requires_txt(&content, &location)?);
                }
            }
        }
        _ => {
            for requirement in declared {
                requirements.push(Requirement::parse(requirement).map_err(|err| {
                    MetadataError::InvalidRequirement {
                        location: source.to_string(),
                        requirement: requirement.to_string(),
                        err,
                    }
                })?);
            }
        }
    }

    let legacy_requires = headers.get_all_values("Requires").collect::<Vec<_>>();
    if !legacy_requires.is_empty() {
        let project_name = project_name_and_version(source, true, cache)
            .ok()
            .flatten()
            .map_or_else(
                || source.to_string(),
                |name_and_version| name_and_version.project_name().to_string(),
            );
        warn_user_once!(
            "{}",
            legacy_requires_warning(&source.to_string(), &project_name, &legacy_requires)
        );
    }

    Ok(requirements)
}

/// The warning shown when metadata declares dependencies with the legacy `Requires` field.
pub fn legacy_requires_warning(source: &str, project_name: &str, requires: &[&str]) -> String {
    let field = if requires.len() == 1 {
        "field"
    } else {
        "fields"
    };
    let listing = requires
        .iter()
        .enumerate()
        .map(|(index, requirement)| format!("{}.) Requires: {requirement}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Ignoring {count} `Requires` {field} in {source} metadata:\n{listing}\n\nYou may have issues using the '{project_name}' distribution as a result.",
        count = requires.len()
    )
}

/// Parse the `requires.txt` format of egg-info metadata.
///
/// A `[extra:marker]` section header applies `extra == "<extra>"` and the marker to every
/// requirement that follows it. Either half may be empty.
///
/// See <https://setuptools.pypa.io/en/latest/deprecated/python_eggs.html#requires-txt>.
pub fn parse_requires_txt(content: &[u8], location: &str) -> Result<Vec<Requirement>, MetadataError> {
    let content = String::from_utf8_lossy(content);
    let mut marker = String::new();
    let mut requirements = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|line| line.strip_suffix(']')) {
            let (extra, section_marker) = section.split_once(':').unwrap_or((section, ""));
            let mut markers = Vec::new();
            if !extra.is_empty() {
                markers.push(format!("extra == \"{extra}\""));
            }
            if !section_marker.is_empty() {
                markers.push(section_marker.to_string());
            }
            // An empty `[]` or `[:]` header leaves the previous marker in force.
            if !markers.is_empty() {
                marker = format!("; {}", markers.join(" and "));
            }
            continue;
        }
        let requirement = format!("{line}{marker}");
        requirements.push(Requirement::parse(&requirement).map_err(|err| {
            MetadataError::InvalidRequirement {
                location: location.to_string(),
                requirement,
                err,
            }
        })?);
    }
    Ok(requirements)
}
