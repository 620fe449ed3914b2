use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use pexl_normalize::PackageName;
use pexl_requirement::Requirement;

use crate::LockedResolve;

/// How much of the dependency graph a lock captures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockStyle {
    /// Only the artifacts for the locked platforms.
    #[default]
    Strict,
    /// Strict, plus sdists wherever they are available.
    Sources,
    /// Every artifact, for any platform matching the target systems.
    Universal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetSystem {
    Linux,
    Mac,
    Windows,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolverVersion {
    #[serde(rename = "pip-legacy-resolver")]
    PipLegacy,
    #[default]
    #[serde(rename = "pip-2020-resolver")]
    Pip2020,
}

/// The settings a lock was created with that any update must reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LockConfiguration {
    pub style: LockStyle,
    pub requires_python: Vec<String>,
    pub target_systems: Vec<TargetSystem>,
}

/// Which distribution formats a resolve may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfiguration {
    pub allow_builds: bool,
    pub allow_wheels: bool,
    pub only_builds: Vec<PackageName>,
    pub only_wheels: Vec<PackageName>,
    pub prefer_older_binary: bool,
    pub use_pep517: Option<bool>,
    pub build_isolation: bool,
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            allow_builds: true,
            allow_wheels: true,
            only_builds: Vec::new(),
            only_wheels: Vec::new(),
            prefer_older_binary: false,
            use_pep517: None,
            build_isolation: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReposConfiguration {
    pub indexes: Vec<Url>,
    pub find_links: Vec<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NetworkConfiguration {
    pub retries: u32,
    /// Seconds.
    pub timeout: u64,
    pub proxy: Option<String>,
    pub cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
}

impl Default for NetworkConfiguration {
    fn default() -> Self {
        Self {
            retries: 5,
            timeout: 15,
            proxy: None,
            cert: None,
            client_cert: None,
        }
    }
}

/// Settings for the resolver backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipConfiguration {
    pub pip_version: Option<String>,
    pub resolver_version: ResolverVersion,
    pub allow_prereleases: bool,
    pub build_configuration: BuildConfiguration,
    pub transitive: bool,
    pub repos: ReposConfiguration,
    pub network: NetworkConfiguration,
    pub max_jobs: Option<usize>,
    pub use_pip_config: bool,
}

impl Default for PipConfiguration {
    fn default() -> Self {
        Self {
            pip_version: None,
            resolver_version: ResolverVersion::default(),
            allow_prereleases: false,
            build_configuration: BuildConfiguration::default(),
            transitive: true,
            repos: ReposConfiguration::default(),
            network: NetworkConfiguration::default(),
            max_jobs: None,
            use_pip_config: false,
        }
    }
}

/// A lock: the requirements it was created from, the settings used, and one locked resolve per
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Lockfile {
    /// Where the lock was read from.
    #[serde(skip)]
    pub source: PathBuf,
    pub style: LockStyle,
    pub requires_python: Vec<String>,
    pub target_systems: Vec<TargetSystem>,
    pub pip_version: Option<String>,
    pub resolver_version: ResolverVersion,
    pub allow_prereleases: bool,
    #[serde(flatten)]
    pub build_configuration: BuildConfiguration,
    pub transitive: bool,
    pub requirements: Vec<Requirement>,
    pub constraints: Vec<Requirement>,
    pub locked_resolves: Vec<LockedResolve>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            style: LockStyle::default(),
            requires_python: Vec::new(),
            target_systems: Vec::new(),
            pip_version: None,
            resolver_version: ResolverVersion::default(),
            allow_prereleases: false,
            build_configuration: BuildConfiguration::default(),
            transitive: true,
            requirements: Vec::new(),
            constraints: Vec::new(),
            locked_resolves: Vec::new(),
        }
    }
}

impl Lockfile {
    pub fn lock_configuration(&self) -> LockConfiguration {
        LockConfiguration {
            style: self.style,
            requires_python: self.requires_python.clone(),
            target_systems: self.target_systems.clone(),
        }
    }

    /// The resolver settings recorded in this lock, combined with the given repositories and
    /// network settings.
    pub fn pip_configuration(
        &self,
        repos: ReposConfiguration,
        network: NetworkConfiguration,
        max_jobs: Option<usize>,
        use_pip_config: bool,
    ) -> PipConfiguration {
        PipConfiguration {
            pip_version: self.pip_version.clone(),
            resolver_version: self.resolver_version,
            allow_prereleases: self.allow_prereleases,
            build_configuration: self.build_configuration.clone(),
            transitive: self.transitive,
            repos,
            network,
            max_jobs,
            use_pip_config,
        }
    }
}
