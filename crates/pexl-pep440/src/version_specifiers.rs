use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unicode_width::UnicodeWidthStr;

use crate::{Version, VersionSpecifier, VersionSpecifierParseError};

/// A comma separated conjunction of clauses, such as `>=1.19, <2`.
///
/// The empty set matches every version. Two sets are equal when they hold the same clauses in
/// any order; display keeps the order they were written in.
#[derive(Debug, Clone, Default)]
pub struct VersionSpecifiers(Vec<VersionSpecifier>);

impl VersionSpecifiers {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VersionSpecifier> {
        self.0.iter()
    }

    pub fn allows_prereleases(&self) -> bool {
        self.iter().any(VersionSpecifier::allows_prereleases)
    }

    /// Whether `version` satisfies every clause, ignoring pre-release policy.
    pub fn contains(&self, version: &Version) -> bool {
        self.iter().all(|clause| clause.contains(version))
    }

    /// Whether `version` satisfies every clause under the usual pre-release policy.
    ///
    /// Left unset, `prereleases` defaults to whether some clause names a pre-release.
    pub fn contains_with_prereleases(&self, version: &Version, prereleases: Option<bool>) -> bool {
        if version.any_prerelease() && !prereleases.unwrap_or_else(|| self.allows_prereleases()) {
            return false;
        }
        self.contains(version)
    }

    fn canonical(&self) -> Vec<&VersionSpecifier> {
        let mut clauses = self.0.iter().collect::<Vec<_>>();
        clauses.sort_unstable();
        clauses
    }
}

impl PartialEq for VersionSpecifiers {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for VersionSpecifiers {}

impl Hash for VersionSpecifiers {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for VersionSpecifiers {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionSpecifiers {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl FromIterator<VersionSpecifier> for VersionSpecifiers {
    fn from_iter<T: IntoIterator<Item = VersionSpecifier>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<VersionSpecifier> for VersionSpecifiers {
    fn from(clause: VersionSpecifier) -> Self {
        Self(vec![clause])
    }
}

impl<'a> IntoIterator for &'a VersionSpecifiers {
    type Item = &'a VersionSpecifier;
    type IntoIter = std::slice::Iter<'a, VersionSpecifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for VersionSpecifiers {
    type Err = VersionSpecifiersParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::empty());
        }
        let mut offset = 0;
        s.split(',')
            .map(|clause| {
                let start = offset;
                offset += clause.len() + 1;
                VersionSpecifier::from_str(clause)
                    .map_err(|err| VersionSpecifiersParseError::new(err, s, start, clause))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl fmt::Display for VersionSpecifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses = self.iter();
        if let Some(first) = clauses.next() {
            write!(f, "{first}")?;
        }
        for clause in clauses {
            write!(f, ", {clause}")?;
        }
        Ok(())
    }
}

impl Serialize for VersionSpecifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionSpecifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// A bad clause inside a comma separated specifier list, with its location for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifiersParseError(Box<ClauseError>);

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClauseError {
    err: VersionSpecifierParseError,
    input: String,
    start: usize,
    end: usize,
}

impl VersionSpecifiersParseError {
    /// Locate `clause`, found at byte `start` of `input`, ignoring its surrounding whitespace.
    fn new(err: VersionSpecifierParseError, input: &str, start: usize, clause: &str) -> Self {
        let start = start + (clause.len() - clause.trim_start().len());
        let end = start + clause.trim().len();
        Self(Box::new(ClauseError {
            err,
            input: input.to_string(),
            start,
            end,
        }))
    }

    pub fn kind(&self) -> &VersionSpecifierParseError {
        &self.0.err
    }

    /// Byte range of the offending clause within the parsed input.
    pub fn span(&self) -> Range<usize> {
        self.0.start..self.0.end
    }
}

impl fmt::Display for VersionSpecifiersParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ClauseError {
            err,
            input,
            start,
            end,
        } = self.0.as_ref();
        writeln!(f, "Failed to parse version: {err}:")?;
        writeln!(f, "{input}")?;
        write!(
            f,
            "{}{}",
            " ".repeat(input[..*start].width()),
            "^".repeat(input[*start..*end].width().max(1))
        )
    }
}

impl std::error::Error for VersionSpecifiersParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0.err)
    }
}
