use std::fmt::{Display, Formatter};

use thiserror::Error;

use pexl_pep508::MarkerEnvironment;
use pexl_requirement::Requirement;

use crate::{LockConfiguration, LockedResolve, PipConfiguration};

/// A platform to resolve for, along with the environment its markers evaluate in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub platform_tag: String,
    pub marker_environment: MarkerEnvironment,
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.platform_tag)
    }
}

/// The requirements to resolve, and the constraints every resolved project must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementConfiguration {
    pub requirements: Vec<Requirement>,
    pub constraints: Vec<Requirement>,
}

/// A freshly locked set of requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLock {
    pub requirements: Vec<Requirement>,
    pub locked_resolves: Vec<LockedResolve>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Unsatisfiable(String),
    #[error("{0}")]
    Untranslatable(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Locks requirements for a single target.
///
/// Finding distributions that satisfy the requirements, and the network and build work that
/// entails, happens behind this trait.
pub trait Resolver {
    fn resolve(
        &self,
        lock_configuration: &LockConfiguration,
        requirement_configuration: &RequirementConfiguration,
        target: &Target,
        pip_configuration: &PipConfiguration,
    ) -> Result<ResolvedLock, ResolveError>;
}
