use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::Serialize;

use pexl_normalize::PackageName;
use pexl_requirement::{DistVersion, Requirement};

use crate::{Artifact, ArtifactUrl, Fingerprint, LockedResolve};

/// A project dropped from the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteUpdate {
    pub version: DistVersion,
}

impl Display for DeleteUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "deleted {}", self.version)
    }
}

/// A project locked at a new version, or newly added when there is no original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionUpdate {
    pub original: Option<DistVersion>,
    pub updated: DistVersion,
}

impl Display for VersionUpdate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.original {
            Some(original) => write!(f, "{original} -> {}", self.updated),
            None => write!(f, "added {}", self.updated),
        }
    }
}

/// The same artifact, now found at a different URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlUpdate {
    pub original: ArtifactUrl,
    pub updated: ArtifactUrl,
}

impl UrlUpdate {
    pub fn render_update(&self) -> String {
        format!(
            "{} -> {}",
            self.original.download_url(),
            self.updated.download_url()
        )
    }
}

/// An artifact at an unchanged URL now advertising a different fingerprint.
///
/// This is worth scrutiny: the original fingerprint may have been wrong, or the file at the URL
/// may have been replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintUpdate {
    /// The key of the artifact whose fingerprint changed.
    pub source: String,
    pub original: Fingerprint,
    pub updated: Fingerprint,
}

impl FingerprintUpdate {
    pub fn render_update(&self) -> String {
        format!("{} {} -> {}", self.source, self.original, self.updated)
    }
}

/// An artifact replaced by one with a different URL and fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactUpdate {
    pub original: Artifact,
    pub updated: Artifact,
}

impl ArtifactUpdate {
    pub fn render_update(&self) -> String {
        format!("{} -> {}", self.original, self.updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ArtifactChange {
    Url(UrlUpdate),
    Fingerprint(FingerprintUpdate),
    Artifact(ArtifactUpdate),
}

impl ArtifactChange {
    pub fn render_update(&self) -> String {
        match self {
            Self::Url(update) => update.render_update(),
            Self::Fingerprint(update) => update.render_update(),
            Self::Artifact(update) => update.render_update(),
        }
    }

    /// Classify the change between two artifacts filed under the same key, if there is one.
    fn between(original: &Artifact, updated: &Artifact) -> Option<Self> {
        if original.artifact_key() == updated.artifact_key() {
            return None;
        }
        if original.fingerprint == updated.fingerprint {
            Some(Self::Url(UrlUpdate {
                original: original.url.clone(),
                updated: updated.url.clone(),
            }))
        } else if original.url == updated.url {
            Some(Self::Fingerprint(FingerprintUpdate {
                source: original.key().to_string(),
                original: original.fingerprint.clone(),
                updated: updated.fingerprint.clone(),
            }))
        } else {
            Some(Self::Artifact(ArtifactUpdate {
                original: original.clone(),
                updated: updated.clone(),
            }))
        }
    }
}

/// How the artifacts of a project changed while its version stayed the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactsUpdate {
    pub version: DistVersion,
    pub added: Vec<Artifact>,
    pub updated: Vec<ArtifactChange>,
    pub removed: Vec<Artifact>,
}

impl ArtifactsUpdate {
    /// Diff two artifact sets, matching artifacts up by [`Artifact::key`].
    ///
    /// Artifacts that differ only in whether they were verified are unchanged.
    pub fn calculate<'a>(
        version: DistVersion,
        original: impl IntoIterator<Item = &'a Artifact>,
        updated: impl IntoIterator<Item = &'a Artifact>,
    ) -> Self {
        let mut original_artifacts = original
            .into_iter()
            .map(|artifact| (artifact.key(), artifact))
            .collect::<IndexMap<_, _>>();

        let mut added = Vec::new();
        let mut changes = Vec::new();
        for updated_artifact in updated {
            match original_artifacts.shift_remove(updated_artifact.key()) {
                None => added.push(updated_artifact.clone()),
                Some(original_artifact) => {
                    changes.extend(ArtifactChange::between(original_artifact, updated_artifact));
                }
            }
        }

        Self {
            version,
            added,
            updated: changes,
            removed: original_artifacts.into_values().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// What happened to one project during a resolve update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProjectUpdate {
    Delete(DeleteUpdate),
    Version(VersionUpdate),
    Artifacts(ArtifactsUpdate),
}

/// The result of updating one locked resolve.
///
/// A project mapped to `None` was targeted by the update but came through unchanged. Projects
/// not mentioned at all were left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveUpdate {
    pub updated_resolve: LockedResolve,
    pub updates: IndexMap<PackageName, Option<ProjectUpdate>>,
}

impl ResolveUpdate {
    /// An update that changed nothing.
    pub fn unchanged(locked_resolve: LockedResolve) -> Self {
        Self {
            updated_resolve: locked_resolve,
            updates: IndexMap::new(),
        }
    }
}

/// The result of updating a whole lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockUpdate {
    pub requirements: Vec<Requirement>,
    pub resolves: Vec<ResolveUpdate>,
}

#[cfg(test)]
mod tests;
