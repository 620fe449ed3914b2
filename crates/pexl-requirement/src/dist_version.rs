use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use pexl_pep440::Version;

/// The version of a distribution as declared in its metadata.
///
/// The raw string is kept alongside the strictly parsed PEP 440 [`Version`]. Versions that fail
/// strict parsing, such as `2004d` or `1.0-SNAPSHOT`, are "legacy" and only ever compare by their
/// raw text.
#[derive(Debug, Clone)]
pub struct DistVersion {
    raw: String,
    parsed: Option<Version>,
}

/// The identity of a [`DistVersion`] for equality, hashing and ordering.
///
/// PEP 440 versions sort before legacy versions, which sort lexically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionKey<'a> {
    Parsed(&'a Version),
    Legacy(&'a str),
}

impl DistVersion {
    /// Parse a version, falling back to a legacy version rather than failing.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = Version::from_str(raw.trim()).ok();
        Self { raw, parsed }
    }

    /// The version exactly as written in the metadata.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The PEP 440 version, if the raw version is compliant.
    pub fn parsed(&self) -> Option<&Version> {
        self.parsed.as_ref()
    }

    pub fn is_legacy(&self) -> bool {
        self.parsed.is_none()
    }

    pub fn legacy_version_key(&self) -> VersionKey<'_> {
        match &self.parsed {
            Some(version) => VersionKey::Parsed(version),
            None => VersionKey::Legacy(&self.raw),
        }
    }
}

impl From<Version> for DistVersion {
    fn from(version: Version) -> Self {
        Self {
            raw: version.to_string(),
            parsed: Some(version),
        }
    }
}

impl FromStr for DistVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl PartialEq for DistVersion {
    fn eq(&self, other: &Self) -> bool {
        self.legacy_version_key() == other.legacy_version_key()
    }
}

impl Eq for DistVersion {}

impl Hash for DistVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.legacy_version_key().hash(state);
    }
}

impl PartialOrd for DistVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.legacy_version_key().cmp(&other.legacy_version_key())
    }
}

impl Display for DistVersion {
    /// The normalized form for PEP 440 versions, the raw text otherwise.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.parsed {
            Some(version) => Display::fmt(version, f),
            None => f.write_str(&self.raw),
        }
    }
}

impl Serialize for DistVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for DistVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn parsed_and_legacy() {
        let version = DistVersion::new("1.0.POST1");
        assert!(!version.is_legacy());
        assert_eq!(version.raw(), "1.0.POST1");
        assert_eq!(version.to_string(), "1.0.post1");

        let legacy = DistVersion::new("1.0-SNAPSHOT");
        assert!(legacy.is_legacy());
        assert_eq!(legacy.to_string(), "1.0-SNAPSHOT");
        assert_eq!(legacy.legacy_version_key(), VersionKey::Legacy("1.0-SNAPSHOT"));
    }

    #[test]
    fn equality_uses_key() {
        assert_eq!(DistVersion::new("1.0"), DistVersion::new("1.0.0"));
        assert_eq!(DistVersion::new("1.0a1"), DistVersion::new("1.0.alpha1"));
        assert_ne!(DistVersion::new("2004d"), DistVersion::new("2004D"));
        let set = [
            DistVersion::new("1.0"),
            DistVersion::new("1.0.0"),
            DistVersion::new("2004d"),
        ]
        .into_iter()
        .collect::<HashSet<_>>();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn ordering() {
        let mut versions = ["zzz", "1.10", "1.2", "1.2a1", "2004d"]
            .into_iter()
            .map(DistVersion::new)
            .collect::<Vec<_>>();
        versions.sort();
        let sorted = versions
            .iter()
            .map(DistVersion::raw)
            .collect::<Vec<_>>();
        assert_eq!(sorted, ["1.2a1", "1.2", "1.10", "2004d", "zzz"]);
    }

    #[test]
    fn serde_keeps_raw() {
        let version = DistVersion::new("1.0.POST1");
        assert_eq!(serde_json::to_string(&version).unwrap(), r#""1.0.POST1""#);
        let parsed: DistVersion = serde_json::from_str(r#""1.0-SNAPSHOT""#).unwrap();
        assert!(parsed.is_legacy());
    }
}
