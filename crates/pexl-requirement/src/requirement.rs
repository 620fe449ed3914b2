use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

use pexl_normalize::{ExtraName, PackageName};
use pexl_pep440::{Operator, Version, VersionSpecifier, VersionSpecifiers};
use pexl_pep508::{MarkerEnvironment, MarkerTree, Pep508Error, VersionOrUrl};

use crate::DistVersion;

/// A requirement string failed to parse.
#[derive(Debug, Error)]
#[error("Invalid requirement: {0}")]
pub struct RequirementParseError(#[from] Box<Pep508Error>);

/// Something a [`Requirement`] can be tested against.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    /// An unparsed version string.
    Raw(&'a str),
    Version(&'a Version),
    DistVersion(&'a DistVersion),
    /// A project at a version, which only matches requirements on the same project.
    Named {
        name: &'a PackageName,
        version: &'a DistVersion,
    },
}

impl<'a> From<&'a str> for Candidate<'a> {
    fn from(raw: &'a str) -> Self {
        Self::Raw(raw)
    }
}

impl<'a> From<&'a Version> for Candidate<'a> {
    fn from(version: &'a Version) -> Self {
        Self::Version(version)
    }
}

impl<'a> From<&'a DistVersion> for Candidate<'a> {
    fn from(version: &'a DistVersion) -> Self {
        Self::DistVersion(version)
    }
}

/// A dependency requirement, such as `requests[security]>=2.8.1; python_version > "3.8"`.
///
/// The project name is kept as written for display, but the canonical [`PackageName`] is what
/// identifies the project. Equality compares the canonical name, URL, extras, specifiers and the
/// rendered marker.
#[derive(Debug, Clone)]
pub struct Requirement {
    name: String,
    project_name: PackageName,
    url: Option<Url>,
    extras: BTreeSet<ExtraName>,
    specifier: VersionSpecifiers,
    marker: Option<MarkerTree>,
    /// The operand of a sole `===` clause, matched by exact string comparison.
    legacy_version: Option<String>,
}

impl Requirement {
    /// Parse a PEP 508 requirement string.
    pub fn parse(requirement: &str) -> Result<Self, RequirementParseError> {
        let parsed = pexl_pep508::Requirement::from_str(requirement).map_err(Box::new)?;
        let name = requirement
            .trim_start()
            .split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Self::from_pep508(name, parsed))
    }

    fn from_pep508(name: String, requirement: pexl_pep508::Requirement) -> Self {
        let (url, specifier) = match requirement.version_or_url {
            Some(VersionOrUrl::Url(url)) => (Some(url), VersionSpecifiers::empty()),
            Some(VersionOrUrl::VersionSpecifier(specifier)) => (None, specifier),
            None => (None, VersionSpecifiers::empty()),
        };
        Self::new(
            name,
            requirement.name,
            url,
            requirement.extras,
            specifier,
            requirement.marker,
        )
    }

    fn new(
        name: String,
        project_name: PackageName,
        url: Option<Url>,
        extras: impl IntoIterator<Item = ExtraName>,
        specifier: VersionSpecifiers,
        marker: Option<MarkerTree>,
    ) -> Self {
        let legacy_version = match specifier.iter().collect::<Vec<_>>().as_slice() {
            [clause] if clause.operator() == Operator::ExactEqual => clause
                .arbitrary()
                .map(ToString::to_string)
                .or_else(|| clause.version().map(ToString::to_string)),
            _ => None,
        };
        Self {
            name,
            project_name,
            url,
            extras: extras.into_iter().collect(),
            specifier,
            marker,
            legacy_version,
        }
    }

    /// A requirement pinning `project_name` to exactly `version`.
    ///
    /// Legacy versions pin with `===` against the raw version string.
    pub fn pinned(project_name: &PackageName, version: &DistVersion) -> Self {
        let clause = match version.parsed() {
            Some(parsed) => VersionSpecifier::equals_version(parsed.clone()),
            None => VersionSpecifier::arbitrary_equal(version.raw()),
        };
        Self::new(
            project_name.to_string(),
            project_name.clone(),
            None,
            [],
            VersionSpecifiers::from_iter([clause]),
            None,
        )
    }

    /// The project name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_name(&self) -> &PackageName {
        &self.project_name
    }

    /// The normalized project name.
    pub fn key(&self) -> &str {
        self.project_name.as_str()
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn extras(&self) -> &BTreeSet<ExtraName> {
        &self.extras
    }

    pub fn specifier(&self) -> &VersionSpecifiers {
        &self.specifier
    }

    pub fn marker(&self) -> Option<&MarkerTree> {
        self.marker.as_ref()
    }

    /// The raw version of a requirement of the form `name===version`.
    pub fn legacy_version(&self) -> Option<&str> {
        self.legacy_version.as_deref()
    }

    /// Whether this requirement applies in `env` when `extras` are requested.
    pub fn evaluate_markers(&self, env: &MarkerEnvironment, extras: &[ExtraName]) -> bool {
        self.marker
            .as_ref()
            .is_none_or(|marker| marker.evaluate(env, extras))
    }

    /// Whether the candidate satisfies this requirement, admitting pre-releases.
    pub fn matches<'a>(&self, candidate: impl Into<Candidate<'a>>) -> bool {
        self.contains(candidate, Some(true))
    }

    /// Whether the candidate satisfies this requirement.
    ///
    /// Candidates naming a project must name this requirement's project. A `===` requirement
    /// compares raw version strings. Otherwise the version must satisfy the specifiers under the
    /// pre-release policy, which `prereleases` overrides when set.
    pub fn contains<'a>(
        &self,
        candidate: impl Into<Candidate<'a>>,
        prereleases: Option<bool>,
    ) -> bool {
        let candidate = candidate.into();
        if let Candidate::Named { name, .. } = candidate {
            if *name != self.project_name {
                return false;
            }
        }

        if let Some(legacy_version) = &self.legacy_version {
            let raw = match candidate {
                Candidate::Raw(raw) => raw.to_string(),
                Candidate::Version(version) => version.to_string(),
                Candidate::DistVersion(version) | Candidate::Named { version, .. } => {
                    version.raw().to_string()
                }
            };
            return raw == *legacy_version;
        }

        let parsed;
        let version = match candidate {
            Candidate::Raw(raw) => {
                let Ok(version) = Version::from_str(raw.trim()) else {
                    return false;
                };
                parsed = version;
                &parsed
            }
            Candidate::Version(version) => version,
            Candidate::DistVersion(version) | Candidate::Named { version, .. } => {
                let Some(version) = version.parsed() else {
                    return false;
                };
                version
            }
        };
        self.specifier
            .contains_with_prereleases(version, prereleases)
    }

    /// Rebuild the PEP 508 form of this requirement.
    pub fn to_pep508(&self) -> pexl_pep508::Requirement {
        let version_or_url = match (&self.url, self.specifier.is_empty()) {
            (Some(url), _) => Some(VersionOrUrl::Url(url.clone())),
            (None, false) => Some(VersionOrUrl::VersionSpecifier(self.specifier.clone())),
            (None, true) => None,
        };
        pexl_pep508::Requirement {
            name: self.project_name.clone(),
            extras: self.extras.iter().cloned().collect(),
            version_or_url,
            marker: self.marker.clone(),
        }
    }

    fn marker_key(&self) -> Option<String> {
        self.marker.as_ref().map(ToString::to_string)
    }
}

impl From<pexl_pep508::Requirement> for Requirement {
    fn from(requirement: pexl_pep508::Requirement) -> Self {
        let name = requirement.name.to_string();
        Self::from_pep508(name, requirement)
    }
}

impl FromStr for Requirement {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.project_name == other.project_name
            && self.url == other.url
            && self.extras == other.extras
            && self.specifier == other.specifier
            && self.marker_key() == other.marker_key()
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project_name.hash(state);
        self.url.hash(state);
        self.extras.hash(state);
        self.specifier.hash(state);
        self.marker_key().hash(state);
    }
}

impl Display for Requirement {
    /// Renders `name[extras]specifier @ url ; marker`, omitting absent parts.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            let extras = self
                .extras
                .iter()
                .map(ExtraName::as_str)
                .collect::<Vec<_>>();
            write!(f, "[{}]", extras.join(","))?;
        }
        let mut clauses = self
            .specifier
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        clauses.sort();
        f.write_str(&clauses.join(","))?;
        if let Some(url) = &self.url {
            write!(f, " @ {url}")?;
            if self.marker.is_some() {
                f.write_str(" ")?;
            }
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        Self::parse(&string).map_err(serde::de::Error::custom)
    }
}
