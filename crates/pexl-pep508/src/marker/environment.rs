use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use pexl_pep440::{Version, VersionParseError};

use crate::marker::{MarkerValueString, MarkerValueVersion};

/// A version marker value, kept alongside its original spelling.
///
/// `in` comparisons work on the spelling, so `python_version in '3.10 3.11'` must see `3.10`
/// rather than a normalized form.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StringVersion {
    pub string: String,
    pub version: Version,
}

impl FromStr for StringVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = Version::from_str(s)?;
        Ok(Self {
            string: s.to_string(),
            version,
        })
    }
}

impl Display for StringVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.string)
    }
}

impl Serialize for StringVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.string)
    }
}

impl<'de> Deserialize<'de> for StringVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// What a lock target's interpreter reports for each marker.
///
/// Locks store one of these per target, which is how a resolve is re-evaluated for a platform
/// other than the running one.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MarkerEnvironment {
    pub implementation_name: String,
    pub implementation_version: StringVersion,
    pub os_name: String,
    pub platform_machine: String,
    pub platform_python_implementation: String,
    pub platform_release: String,
    pub platform_system: String,
    pub platform_version: String,
    pub python_full_version: StringVersion,
    pub python_version: StringVersion,
    pub sys_platform: String,
}

impl MarkerValueVersion {
    pub(crate) fn lookup(self, env: &MarkerEnvironment) -> &StringVersion {
        match self {
            Self::ImplementationVersion => &env.implementation_version,
            Self::PythonFullVersion => &env.python_full_version,
            Self::PythonVersion => &env.python_version,
        }
    }
}

impl MarkerValueString {
    pub(crate) fn lookup(self, env: &MarkerEnvironment) -> &str {
        match self {
            Self::ImplementationName => &env.implementation_name,
            Self::OsName => &env.os_name,
            Self::PlatformMachine => &env.platform_machine,
            Self::PlatformPythonImplementation => &env.platform_python_implementation,
            Self::PlatformRelease => &env.platform_release,
            Self::PlatformSystem => &env.platform_system,
            Self::PlatformVersion => &env.platform_version,
            Self::SysPlatform => &env.sys_platform,
        }
    }
}
