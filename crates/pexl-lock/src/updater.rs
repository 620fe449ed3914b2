use indexmap::IndexMap;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use tracing::{debug, error, warn};

use pexl_normalize::PackageName;
use pexl_requirement::Requirement;

use crate::{
    ArtifactUrl, ArtifactsUpdate, DeleteUpdate, Fingerprint, LockConfiguration, LockUpdate,
    LockUpdateError, LockUpdaterError, LockedRequirement, LockedResolve, Lockfile,
    NetworkConfiguration, PipConfiguration, ProjectUpdate, ReposConfiguration,
    RequirementConfiguration, ResolveUpdate, Resolver, Target, TargetError, VersionUpdate,
};

/// Updates a locked resolve in whole or in part.
///
/// Without update constraints, the whole resolve may move to the latest distributions that
/// still satisfy its requirements. With them, only the targeted projects may change: a plain
/// project name picks up the latest compatible version, and a constraint with a specifier
/// searches for a matching version that keeps the rest of the resolve intact. Every other
/// project is checked to have come through untouched.
#[derive(Debug, Clone)]
pub struct ResolveUpdater {
    original_requirements: Vec<Requirement>,
    update_constraints: IndexMap<PackageName, Requirement>,
    deletes: FxHashSet<PackageName>,
    lock_configuration: LockConfiguration,
    pip_configuration: PipConfiguration,
}

impl ResolveUpdater {
    /// Replacements swap out the original requirement on the same project. Updates and
    /// replacements both become update constraints, overriding any lock constraint on their
    /// project.
    pub fn create(
        requirements: impl IntoIterator<Item = Requirement>,
        constraints: impl IntoIterator<Item = Requirement>,
        updates: impl IntoIterator<Item = Requirement>,
        replacements: impl IntoIterator<Item = Requirement>,
        deletes: impl IntoIterator<Item = PackageName>,
        lock_configuration: LockConfiguration,
        pip_configuration: PipConfiguration,
    ) -> Self {
        let replacements = replacements.into_iter().collect::<Vec<_>>();

        let mut original_requirements = requirements
            .into_iter()
            .map(|requirement| (requirement.project_name().clone(), requirement))
            .collect::<IndexMap<_, _>>();
        original_requirements.extend(
            replacements
                .iter()
                .map(|replacement| (replacement.project_name().clone(), replacement.clone())),
        );

        let original_constraints = constraints
            .into_iter()
            .map(|constraint| (constraint.project_name().clone(), constraint))
            .collect::<IndexMap<_, _>>();

        let mut update_constraints = IndexMap::new();
        for change in updates.into_iter().chain(replacements) {
            if let Some(original) = original_constraints.get(change.project_name()) {
                warn!("Over-riding original constraint {original} with {change}.");
            }
            update_constraints.insert(change.project_name().clone(), change);
        }

        Self {
            original_requirements: original_requirements.into_values().collect(),
            update_constraints,
            deletes: deletes.into_iter().collect(),
            lock_configuration,
            pip_configuration,
        }
    }

    /// The original requirements with replacements applied and deleted projects removed.
    pub fn updated_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.original_requirements
            .iter()
            .filter(|requirement| !self.deletes.contains(requirement.project_name()))
    }

    /// What to hand the resolver, or `None` when the locked resolve can be used as is.
    ///
    /// Every locked project is constrained to its current pin unless an update constraint
    /// targets it. Update constraints on projects not yet locked become new requirements.
    fn requirement_configuration(
        &self,
        locked_resolve: &LockedResolve,
        pin_all: bool,
    ) -> Option<RequirementConfiguration> {
        if self.update_constraints.is_empty() && !pin_all {
            return None;
        }

        let mut update_constraints = self.update_constraints.clone();
        let constraints = locked_resolve
            .locked_requirements
            .iter()
            .map(|locked_requirement| {
                let pin = &locked_requirement.pin;
                update_constraints
                    .shift_remove(&pin.project_name)
                    .unwrap_or_else(|| pin.as_requirement())
            })
            .collect::<Vec<_>>();

        let mut requirements = self.original_requirements.clone();
        for requirement in update_constraints.into_values() {
            if !requirements.contains(&requirement) {
                requirements.push(requirement);
            }
        }

        Some(RequirementConfiguration {
            requirements,
            constraints,
        })
    }

    /// Update `locked_resolve` for `target`.
    pub fn update_resolve(
        &self,
        resolver: &impl Resolver,
        locked_resolve: &LockedResolve,
        target: &Target,
        pin_all: bool,
    ) -> Result<ResolveUpdate, LockUpdateError> {
        let mut updated_resolve = locked_resolve.clone();
        let mut updated_requirements = self.original_requirements.clone();
        if let Some(requirement_configuration) =
            self.requirement_configuration(locked_resolve, pin_all)
        {
            debug!("Re-resolving the lock for {target}");
            let resolved = resolver
                .resolve(
                    &self.lock_configuration,
                    &requirement_configuration,
                    target,
                    &self.pip_configuration,
                )
                .inspect_err(|_| {
                    error!(
                        "Given the lock requirements:\n{}\n\nThe following lock update constraints could not all be satisfied:\n{}\n",
                        requirement_configuration.requirements.iter().join("\n"),
                        requirement_configuration.constraints.iter().join("\n"),
                    );
                })?;
            let count = resolved.locked_resolves.len();
            let Ok([resolve]) = <[LockedResolve; 1]>::try_from(resolved.locked_resolves) else {
                return Err(LockUpdateError::UnexpectedResolveCount(count));
            };
            updated_resolve = resolve;
            updated_requirements = resolved.requirements;
        }

        let mut updates = IndexMap::new();

        if !self.deletes.is_empty() {
            let reduced_requirements = updated_requirements
                .into_iter()
                .filter(|requirement| !self.deletes.contains(requirement.project_name()))
                .collect::<Vec<_>>();
            let included =
                updated_resolve.reachable(&reduced_requirements, &target.marker_environment)?;
            for locked_requirement in &updated_resolve.locked_requirements {
                let pin = &locked_requirement.pin;
                if !included.contains(&pin.project_name) {
                    debug!("Deleting {pin} from the lock for {target}");
                    updates.insert(
                        pin.project_name.clone(),
                        Some(ProjectUpdate::Delete(DeleteUpdate {
                            version: pin.version.clone(),
                        })),
                    );
                }
            }
            updated_resolve
                .locked_requirements
                .retain(|locked_requirement| included.contains(&locked_requirement.pin.project_name));
        }

        let mut updated_by_project_name = updated_resolve
            .locked_requirements
            .iter()
            .map(|locked_requirement| (&locked_requirement.pin.project_name, locked_requirement))
            .collect::<IndexMap<_, _>>();
        for locked_requirement in &locked_resolve.locked_requirements {
            let project_name = &locked_requirement.pin.project_name;
            let Some(updated_requirement) = updated_by_project_name.shift_remove(project_name)
            else {
                continue;
            };
            let targeted = self.update_constraints.contains_key(project_name);
            if !self.update_constraints.is_empty() && !targeted {
                check_undisturbed(locked_requirement, updated_requirement)?;
            } else if locked_requirement.pin != updated_requirement.pin {
                updates.insert(
                    project_name.clone(),
                    Some(ProjectUpdate::Version(VersionUpdate {
                        original: Some(locked_requirement.pin.version.clone()),
                        updated: updated_requirement.pin.version.clone(),
                    })),
                );
            } else if !locked_requirement
                .iter_artifacts()
                .map(|artifact| artifact.artifact_key())
                .eq(updated_requirement
                    .iter_artifacts()
                    .map(|artifact| artifact.artifact_key()))
            {
                updates.insert(
                    project_name.clone(),
                    Some(ProjectUpdate::Artifacts(ArtifactsUpdate::calculate(
                        locked_requirement.pin.version.clone(),
                        locked_requirement.iter_artifacts(),
                        updated_requirement.iter_artifacts(),
                    ))),
                );
            } else if targeted {
                updates.insert(project_name.clone(), None);
            }
        }

        // Anything left was added.
        for (project_name, locked_requirement) in updated_by_project_name {
            updates.insert(
                project_name.clone(),
                Some(ProjectUpdate::Version(VersionUpdate {
                    original: None,
                    updated: locked_requirement.pin.version.clone(),
                })),
            );
        }

        Ok(ResolveUpdate {
            updated_resolve: LockedResolve::new(
                locked_resolve.platform_tag.clone(),
                updated_resolve.locked_requirements,
            ),
            updates,
        })
    }
}

/// Check that a project the update did not target was left exactly as it was.
fn check_undisturbed(
    original: &LockedRequirement,
    updated: &LockedRequirement,
) -> Result<(), LockUpdateError> {
    if original.pin != updated.pin {
        return Err(LockUpdateError::UndisturbedPinChanged {
            original: original.pin.as_requirement(),
            updated: updated.pin.as_requirement(),
        });
    }
    if original.artifact.artifact_key() != updated.artifact.artifact_key() {
        return Err(LockUpdateError::UndisturbedArtifactChanged {
            original: original.pin.as_requirement(),
            original_artifact: original.artifact.to_string(),
            updated_artifact: updated.artifact.to_string(),
        });
    }
    if additional_artifact_keys(original) != additional_artifact_keys(updated) {
        return Err(LockUpdateError::UndisturbedAdditionalArtifactsChanged {
            original: original.pin.as_requirement(),
            original_artifacts: original.additional_artifacts.iter().join("\n"),
            updated_artifacts: updated.additional_artifacts.iter().join("\n"),
        });
    }
    Ok(())
}

/// Additional artifacts compare as a set, so reordering them is not a change.
fn additional_artifact_keys(
    locked_requirement: &LockedRequirement,
) -> FxHashSet<(&ArtifactUrl, &Fingerprint)> {
    locked_requirement
        .additional_artifacts
        .iter()
        .map(|artifact| artifact.artifact_key())
        .collect()
}

/// One locked resolve to update, and the target to update it for.
#[derive(Debug, Clone)]
pub struct ResolveUpdateRequest {
    pub target: Target,
    pub locked_resolve: LockedResolve,
}

/// Updates every locked resolve of a lock, reporting all failing targets together.
#[derive(Debug, Clone)]
pub struct LockUpdater {
    lockfile: Lockfile,
    lock_configuration: LockConfiguration,
    pip_configuration: PipConfiguration,
}

impl LockUpdater {
    pub fn create(
        lockfile: Lockfile,
        repos: ReposConfiguration,
        network: NetworkConfiguration,
        max_jobs: Option<usize>,
        use_pip_config: bool,
    ) -> Self {
        let lock_configuration = lockfile.lock_configuration();
        let pip_configuration = lockfile.pip_configuration(repos, network, max_jobs, use_pip_config);
        Self {
            lockfile,
            lock_configuration,
            pip_configuration,
        }
    }

    pub fn lockfile(&self) -> &Lockfile {
        &self.lockfile
    }

    pub fn lock_configuration(&self) -> &LockConfiguration {
        &self.lock_configuration
    }

    pub fn pip_configuration(&self) -> &PipConfiguration {
        &self.pip_configuration
    }

    /// Apply `updates`, `replacements` and `deletes` to each requested locked resolve.
    ///
    /// With `pin`, every locked project is constrained to its current version even when nothing
    /// else is requested. Targets are updated one after another, and a failure for one target
    /// does not stop the others from being attempted.
    pub fn update(
        &self,
        resolver: &impl Resolver,
        update_requests: &[ResolveUpdateRequest],
        updates: &[Requirement],
        replacements: &[Requirement],
        deletes: &[PackageName],
        pin: bool,
    ) -> Result<LockUpdate, LockUpdaterError> {
        if !pin && updates.is_empty() && replacements.is_empty() && deletes.is_empty() {
            return Ok(LockUpdate {
                requirements: self.lockfile.requirements.clone(),
                resolves: update_requests
                    .iter()
                    .map(|request| ResolveUpdate::unchanged(request.locked_resolve.clone()))
                    .collect(),
            });
        }

        let resolve_updater = ResolveUpdater::create(
            self.lockfile.requirements.iter().cloned(),
            self.lockfile.constraints.iter().cloned(),
            updates.iter().cloned(),
            replacements.iter().cloned(),
            deletes.iter().cloned(),
            self.lock_configuration.clone(),
            self.pip_configuration.clone(),
        );

        let mut locked_resolves = self
            .lockfile
            .locked_resolves
            .iter()
            .map(|locked_resolve| (locked_resolve.platform_tag.clone(), locked_resolve.clone()))
            .collect::<IndexMap<_, _>>();
        let mut updates_by_platform_tag = IndexMap::new();
        let mut errors = Vec::new();

        // TODO: Update targets in parallel once `Resolver` implementations can run concurrently.
        for request in update_requests {
            match resolve_updater.update_resolve(resolver, &request.locked_resolve, &request.target, pin)
            {
                Ok(resolve_update) => {
                    let platform_tag = request.locked_resolve.platform_tag.clone();
                    locked_resolves.insert(platform_tag.clone(), resolve_update.updated_resolve);
                    updates_by_platform_tag.insert(platform_tag, resolve_update.updates);
                }
                Err(error) => errors.push(TargetError {
                    platform_tag: request.target.platform_tag.clone(),
                    error,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(LockUpdaterError::Targets {
                lockfile: self.lockfile.source.clone(),
                errors,
            });
        }

        Ok(LockUpdate {
            requirements: resolve_updater.updated_requirements().cloned().collect(),
            resolves: locked_resolves
                .into_iter()
                .map(|(platform_tag, updated_resolve)| ResolveUpdate {
                    updates: updates_by_platform_tag
                        .shift_remove(&platform_tag)
                        .unwrap_or_default(),
                    updated_resolve,
                })
                .collect(),
        })
    }
}
