//! Locked resolves and the machinery for updating them.
//!
//! A [`LockUpdater`] re-resolves each locked resolve of a [`Lockfile`] against a set of targeted
//! updates, replacements and deletions, and reports what changed. Projects that are not targeted
//! must come through an update unchanged; any drift is an error rather than a silent change.

pub use error::{LockUpdateError, LockUpdaterError, MissingDependency, TargetError, ADVICE};
pub use locked_resolve::{
    Artifact, ArtifactUrl, Fingerprint, LockedRequirement, LockedResolve, Pin,
};
pub use lockfile::{
    BuildConfiguration, LockConfiguration, LockStyle, Lockfile, NetworkConfiguration,
    PipConfiguration, ReposConfiguration, ResolverVersion, TargetSystem,
};
pub use resolver::{RequirementConfiguration, ResolveError, ResolvedLock, Resolver, Target};
pub use update::{
    ArtifactChange, ArtifactUpdate, ArtifactsUpdate, DeleteUpdate, FingerprintUpdate, LockUpdate,
    ProjectUpdate, ResolveUpdate, UrlUpdate, VersionUpdate,
};
pub use updater::{LockUpdater, ResolveUpdateRequest, ResolveUpdater};

mod error;
mod locked_resolve;
mod lockfile;
mod resolver;
mod update;
mod updater;
