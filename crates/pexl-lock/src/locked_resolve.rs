use std::collections::{BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use pexl_normalize::{ExtraName, PackageName};
use pexl_pep440::VersionSpecifiers;
use pexl_pep508::MarkerEnvironment;
use pexl_requirement::{Candidate, DistVersion, Requirement};

use crate::MissingDependency;

/// A content hash advertised for an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub algorithm: String,
    pub hash: String,
}

impl Fingerprint {
    pub fn new(algorithm: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            hash: hash.into(),
        }
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hash)
    }
}

/// The URL an artifact is downloaded from.
///
/// Two URLs are the same when their normalized forms are: scheme and host case and any fragment
/// are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactUrl {
    raw_url: String,
    download_url: String,
    normalized_url: String,
}

impl ArtifactUrl {
    pub fn parse(raw_url: &str) -> Result<Self, url::ParseError> {
        let mut url = Url::parse(raw_url)?;
        let download_url = raw_url
            .split_once('#')
            .map_or(raw_url, |(download_url, _fragment)| download_url)
            .to_string();
        url.set_fragment(None);
        Ok(Self {
            raw_url: raw_url.to_string(),
            download_url,
            normalized_url: url.to_string(),
        })
    }

    /// The URL as written in the lock.
    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    /// The URL without any fragment.
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    pub fn normalized_url(&self) -> &str {
        &self.normalized_url
    }
}

impl PartialEq for ArtifactUrl {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_url == other.normalized_url
    }
}

impl Eq for ArtifactUrl {}

impl Hash for ArtifactUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_url.hash(state);
    }
}

impl TryFrom<String> for ArtifactUrl {
    type Error = url::ParseError;

    fn try_from(raw_url: String) -> Result<Self, Self::Error> {
        Self::parse(&raw_url)
    }
}

impl From<ArtifactUrl> for String {
    fn from(url: ArtifactUrl) -> Self {
        url.raw_url
    }
}

impl FromStr for ArtifactUrl {
    type Err = url::ParseError;

    fn from_str(raw_url: &str) -> Result<Self, Self::Err> {
        Self::parse(raw_url)
    }
}

impl Display for ArtifactUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.download_url)
    }
}

/// A downloadable file, or a bare URL, backing a locked requirement.
///
/// `verified` records whether the fingerprint has been checked locally and plays no part in
/// [`Artifact::artifact_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artifact {
    pub url: ArtifactUrl,
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub verified: bool,
    /// Set for artifacts that are files, such as wheels and sdists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Artifact {
    /// A file artifact, named after the last segment of its URL.
    pub fn file(url: ArtifactUrl, fingerprint: Fingerprint) -> Self {
        let filename = url
            .download_url()
            .rsplit('/')
            .next()
            .filter(|filename| !filename.is_empty())
            .map(ToString::to_string);
        Self {
            url,
            fingerprint,
            verified: false,
            filename,
        }
    }

    /// An artifact known only by its URL, such as a VCS or local project reference.
    pub fn url(url: ArtifactUrl, fingerprint: Fingerprint) -> Self {
        Self {
            url,
            fingerprint,
            verified: false,
            filename: None,
        }
    }

    #[must_use]
    pub fn with_verified(self, verified: bool) -> Self {
        Self { verified, ..self }
    }

    /// What identifies this artifact across lock updates: its file name, or for URL artifacts,
    /// its normalized URL.
    pub fn key(&self) -> &str {
        self.filename
            .as_deref()
            .unwrap_or_else(|| self.url.normalized_url())
    }

    /// The identity of this artifact, ignoring whether it has been verified.
    pub fn artifact_key(&self) -> (&ArtifactUrl, &Fingerprint) {
        (&self.url, &self.fingerprint)
    }
}

impl Display for Artifact {
    /// Renders `url#algorithm:hash`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.url.download_url(), self.fingerprint)
    }
}

/// A project locked at a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pin {
    pub project_name: PackageName,
    pub version: DistVersion,
}

impl Pin {
    pub fn new(project_name: PackageName, version: DistVersion) -> Self {
        Self {
            project_name,
            version,
        }
    }

    /// The requirement for exactly this pin.
    pub fn as_requirement(&self) -> Requirement {
        Requirement::pinned(&self.project_name, &self.version)
    }
}

impl Display for Pin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.project_name, self.version)
    }
}

impl<'a> From<&'a Pin> for Candidate<'a> {
    fn from(pin: &'a Pin) -> Self {
        Candidate::Named {
            name: &pin.project_name,
            version: &pin.version,
        }
    }
}

/// One project of a locked resolve, with every artifact it may be installed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LockedRequirement {
    pub pin: Pin,
    pub artifact: Artifact,
    #[serde(default)]
    pub additional_artifacts: Vec<Artifact>,
    #[serde(default)]
    pub requires_dists: Vec<Requirement>,
    #[serde(default)]
    pub requires_python: Option<VersionSpecifiers>,
}

impl LockedRequirement {
    pub fn new(pin: Pin, artifact: Artifact) -> Self {
        Self {
            pin,
            artifact,
            additional_artifacts: Vec::new(),
            requires_dists: Vec::new(),
            requires_python: None,
        }
    }

    #[must_use]
    pub fn with_additional_artifacts(
        self,
        additional_artifacts: impl IntoIterator<Item = Artifact>,
    ) -> Self {
        Self {
            additional_artifacts: additional_artifacts.into_iter().collect(),
            ..self
        }
    }

    #[must_use]
    pub fn with_requires_dists(self, requires_dists: impl IntoIterator<Item = Requirement>) -> Self {
        Self {
            requires_dists: requires_dists.into_iter().collect(),
            ..self
        }
    }

    /// The primary artifact followed by the additional ones.
    pub fn iter_artifacts(&self) -> impl Iterator<Item = &Artifact> {
        std::iter::once(&self.artifact).chain(&self.additional_artifacts)
    }
}

/// The locked requirements resolved for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LockedResolve {
    /// The platform this resolve was locked for; `None` for a universal lock.
    #[serde(default)]
    pub platform_tag: Option<String>,
    pub locked_requirements: Vec<LockedRequirement>,
}

impl LockedResolve {
    /// Create a resolve with its locked requirements in pin order.
    pub fn new(
        platform_tag: Option<String>,
        locked_requirements: impl IntoIterator<Item = LockedRequirement>,
    ) -> Self {
        let mut locked_requirements = locked_requirements.into_iter().collect::<Vec<_>>();
        locked_requirements.sort_by(|a, b| a.pin.cmp(&b.pin));
        Self {
            platform_tag,
            locked_requirements,
        }
    }

    pub fn find(&self, project_name: &PackageName) -> Option<&LockedRequirement> {
        self.locked_requirements
            .iter()
            .find(|locked_requirement| locked_requirement.pin.project_name == *project_name)
    }

    /// The projects needed to satisfy `requirements` in `marker_env`.
    ///
    /// Requirements are followed through each locked project's declared dependencies, with
    /// markers evaluated under the extras the project was requested with.
    pub fn reachable(
        &self,
        requirements: &[Requirement],
        marker_env: &MarkerEnvironment,
    ) -> Result<FxHashSet<PackageName>, MissingDependency> {
        let by_project_name = self
            .locked_requirements
            .iter()
            .map(|locked_requirement| (&locked_requirement.pin.project_name, locked_requirement))
            .collect::<FxHashMap<_, _>>();

        let mut activated = FxHashMap::<PackageName, BTreeSet<ExtraName>>::default();
        let mut queue = requirements
            .iter()
            .filter(|requirement| requirement.evaluate_markers(marker_env, &[]))
            .map(|requirement| (requirement, None))
            .collect::<VecDeque<(&Requirement, Option<&Pin>)>>();

        while let Some((requirement, required_by)) = queue.pop_front() {
            let project_name = requirement.project_name();
            let Some(locked_requirement) = by_project_name.get(project_name) else {
                return Err(MissingDependency {
                    project_name: project_name.clone(),
                    required_by: required_by.cloned(),
                });
            };

            let newly_activated = match activated.get_mut(project_name) {
                None => {
                    activated.insert(project_name.clone(), requirement.extras().clone());
                    true
                }
                Some(extras) => {
                    let before = extras.len();
                    extras.extend(requirement.extras().iter().cloned());
                    extras.len() > before
                }
            };
            if !newly_activated {
                continue;
            }
            trace!("Reached {} via {requirement}", locked_requirement.pin);

            let extras = activated[project_name].iter().cloned().collect::<Vec<_>>();
            queue.extend(
                locked_requirement
                    .requires_dists
                    .iter()
                    .filter(|dependency| dependency.evaluate_markers(marker_env, &extras))
                    .map(|dependency| (dependency, Some(&locked_requirement.pin))),
            );
        }
        Ok(activated.into_keys().collect())
    }
}

#[cfg(test)]
mod tests;
