use std::path::{Path, PathBuf};

use itertools::Itertools;
use thiserror::Error;

use pexl_normalize::PackageName;
use pexl_requirement::Requirement;

use crate::{Pin, ResolveError};

/// Appended to errors that indicate a bug rather than a problem with the lock or the request.
pub const ADVICE: &str = "\n\nThis is an unexpected programming error in the lock updater. Please file an issue with the lock file and the update request that triggered it.";

/// A project is required but absent from the locked resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "The locked resolve does not contain `{project_name}`, required by {}.",
    .required_by.as_ref().map_or_else(|| "the lock requirements".to_string(), ToString::to_string)
)]
pub struct MissingDependency {
    pub project_name: PackageName,
    pub required_by: Option<Pin>,
}

/// Updating the locked resolve of a single target failed.
#[derive(Debug, Error)]
pub enum LockUpdateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(
        "Expected the lock update to produce exactly 1 locked resolve but it produced {0}.{advice}",
        advice = ADVICE
    )]
    UnexpectedResolveCount(usize),
    #[error(
        "The locked requirement {original} should have been undisturbed by the lock update, but it changed to {updated}.{advice}",
        advice = ADVICE
    )]
    UndisturbedPinChanged {
        original: Requirement,
        updated: Requirement,
    },
    #[error(
        "The locked requirement {original} should have been undisturbed by the lock update, but its primary artifact changed from:\n{original_artifact}\nto:\n{updated_artifact}{advice}",
        advice = ADVICE
    )]
    UndisturbedArtifactChanged {
        original: Requirement,
        original_artifact: String,
        updated_artifact: String,
    },
    #[error(
        "The locked requirement {original} should have been undisturbed by the lock update, but its additional artifact set changed from:\n{original_artifacts}\nto:\n{updated_artifacts}{advice}",
        advice = ADVICE
    )]
    UndisturbedAdditionalArtifactsChanged {
        original: Requirement,
        original_artifacts: String,
        updated_artifacts: String,
    },
    #[error(transparent)]
    MissingDependency(#[from] MissingDependency),
}

/// The update of one target's locked resolve failed.
#[derive(Debug)]
pub struct TargetError {
    pub platform_tag: String,
    pub error: LockUpdateError,
}

/// Updating a lock failed for at least one target.
#[derive(Debug, Error)]
pub enum LockUpdaterError {
    #[error("{}", render_target_errors(.lockfile, .errors))]
    Targets {
        lockfile: PathBuf,
        errors: Vec<TargetError>,
    },
}

fn render_target_errors(lockfile: &Path, errors: &[TargetError]) -> String {
    let listing = errors
        .iter()
        .enumerate()
        .map(|(index, TargetError { platform_tag, error })| {
            format!("\n{}.) {platform_tag}: {error}", index + 1)
        })
        .join("");
    format!(
        "Encountered {} {} updating {}:{listing}",
        errors.len(),
        if errors.len() == 1 { "error" } else { "errors" },
        lockfile.display()
    )
}
