use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The PEP 440 version regex, extended with an optional trailing `.*` for specifiers.
///
/// See: <https://peps.python.org/pep-0440/#appendix-b-parsing-version-strings-with-regular-expressions>
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        ^\s*
        v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [-_.]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:
                [-_.]?
                (?P<post_l>post|rev|r)
                [-_.]?
                (?P<post_n2>[0-9]+)?
            )
        )?
        (?P<dev>
            [-_.]?
            (?P<dev_l>dev)
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        (?P<wildcard>\.\*)?
        \s*$",
    )
    .unwrap()
});

/// An error that occurs when parsing a [`Version`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Version `{0}` doesn't match PEP 440 rules")]
    Invalid(String),
    #[error("A wildcard (`*`) must not be used in a fixed version: `{0}`")]
    Wildcard(String),
    #[error("A wildcard (`*`) can only follow a release segment, found `{0}`")]
    WildcardWithSuffix(String),
    #[error("The number `{number}` in version `{version}` is too large")]
    NumberTooLarge { version: String, number: String },
}

/// The kind of a pre-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrereleaseKind {
    Alpha,
    Beta,
    Rc,
}

impl PrereleaseKind {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Self::Alpha,
            "b" | "beta" => Self::Beta,
            _ => Self::Rc,
        }
    }
}

impl fmt::Display for PrereleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha => f.write_str("a"),
            Self::Beta => f.write_str("b"),
            Self::Rc => f.write_str("rc"),
        }
    }
}

/// A pre-release marker such as `a1` or `rc2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prerelease {
    pub kind: PrereleaseKind,
    pub number: u64,
}

impl fmt::Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.number)
    }
}

/// A segment of a local version label.
///
/// Numeric segments sort above alphanumeric ones; alphanumeric segments compare
/// lexicographically after lowercasing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSegment {
    String(String),
    Number(u64),
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Number(_), Self::String(_)) => Ordering::Greater,
            (Self::String(_), Self::Number(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(segment) => f.write_str(segment),
            Self::Number(segment) => write!(f, "{segment}"),
        }
    }
}

/// A version number such as `1.19`, `1.0a1`, `1.0+abc.5` or `1!2012.2`.
///
/// Equality, ordering and hashing follow PEP 440 semantics, so `1.0 == 1.0.0`. [`Display`]
/// renders the normalized form.
///
/// [`Display`]: fmt::Display
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<Prerelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

impl Version {
    /// Create a final release version from its release segments, e.g. `[1, 2, 3]`.
    pub fn new<I, R>(release: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: std::borrow::Borrow<u64>,
    {
        Self {
            epoch: 0,
            release: release.into_iter().map(|segment| *segment.borrow()).collect(),
            pre: None,
            post: None,
            dev: None,
            local: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    #[must_use]
    pub fn with_pre(mut self, pre: Option<Prerelease>) -> Self {
        self.pre = pre;
        self
    }

    #[must_use]
    pub fn with_post(mut self, post: Option<u64>) -> Self {
        self.post = post;
        self
    }

    #[must_use]
    pub fn with_dev(mut self, dev: Option<u64>) -> Self {
        self.dev = dev;
        self
    }

    #[must_use]
    pub fn with_local(mut self, local: Vec<LocalSegment>) -> Self {
        self.local = local;
        self
    }

    /// Returns this version with its local label removed.
    #[must_use]
    pub fn without_local(mut self) -> Self {
        self.local.clear();
        self
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<Prerelease> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> &[LocalSegment] {
        &self.local
    }

    pub fn is_pre(&self) -> bool {
        self.pre.is_some()
    }

    pub fn is_dev(&self) -> bool {
        self.dev.is_some()
    }

    pub fn is_post(&self) -> bool {
        self.post.is_some()
    }

    pub fn is_local(&self) -> bool {
        !self.local.is_empty()
    }

    /// Whether this is a pre-release or a dev release; either one is a "pre-release" for the
    /// purposes of specifier matching.
    pub fn any_prerelease(&self) -> bool {
        self.is_pre() || self.is_dev()
    }

    /// Whether this version and `other` share an epoch and release, ignoring every suffix.
    pub(crate) fn same_base(&self, other: &Self) -> bool {
        self.epoch == other.epoch
            && compare_release(&self.release, &other.release) == Ordering::Equal
    }

    /// Parse a version that may end in a `.*` wildcard, returning whether it did.
    pub(crate) fn parse_pattern(version: &str) -> Result<(Self, bool), VersionParseError> {
        let captures = VERSION_RE
            .captures(version)
            .ok_or_else(|| VersionParseError::Invalid(version.to_string()))?;
        Self::from_captures(version, &captures)
    }

    fn from_captures(
        input: &str,
        captures: &Captures,
    ) -> Result<(Self, bool), VersionParseError> {
        let number = |name: &str| -> Result<Option<u64>, VersionParseError> {
            captures
                .name(name)
                .map(|digits| {
                    digits
                        .as_str()
                        .parse::<u64>()
                        .map_err(|_| VersionParseError::NumberTooLarge {
                            version: input.to_string(),
                            number: digits.as_str().to_string(),
                        })
                })
                .transpose()
        };

        let epoch = number("epoch")?.unwrap_or_default();

        let mut release = Vec::new();
        if let Some(segments) = captures.name("release") {
            for segment in segments.as_str().split('.') {
                release.push(segment.parse::<u64>().map_err(|_| {
                    VersionParseError::NumberTooLarge {
                        version: input.to_string(),
                        number: segment.to_string(),
                    }
                })?);
            }
        }

        // <https://peps.python.org/pep-0440/#implicit-pre-release-number>
        let pre = captures.name("pre_l").map(|label| label.as_str());
        let pre = match pre {
            Some(label) => Some(Prerelease {
                kind: PrereleaseKind::from_label(label),
                number: number("pre_n")?.unwrap_or_default(),
            }),
            None => None,
        };

        // <https://peps.python.org/pep-0440/#implicit-post-release-number>
        let post = if captures.name("post").is_some() {
            Some(
                number("post_n1")?
                    .or(number("post_n2")?)
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        // <https://peps.python.org/pep-0440/#implicit-development-release-number>
        let dev = if captures.name("dev").is_some() {
            Some(number("dev_n")?.unwrap_or_default())
        } else {
            None
        };

        let local = captures
            .name("local")
            .map(|local| {
                local
                    .as_str()
                    .split(['-', '_', '.'])
                    .map(|segment| match segment.parse::<u64>() {
                        Ok(number) => LocalSegment::Number(number),
                        Err(_) => LocalSegment::String(segment.to_ascii_lowercase()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let wildcard = captures.name("wildcard").is_some();
        let version = Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        };

        if wildcard && (version.any_prerelease() || version.is_post() || version.is_local()) {
            return Err(VersionParseError::WildcardWithSuffix(input.to_string()));
        }

        Ok((version, wildcard))
    }

    /// The ordering key for everything after the release segment.
    ///
    /// Mirrors the ordering `.devN, aN, bN, rcN, <final>, .postN`, where a dev release of a final
    /// release sorts before every pre-release, a missing post number sorts lowest, and a missing
    /// dev number sorts highest.
    fn suffix_key(&self) -> (u8, u64, Option<u64>, u64, &[LocalSegment]) {
        let (rank, pre_number) = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, 0),
            (Some(pre), ..) => (
                match pre.kind {
                    PrereleaseKind::Alpha => 1,
                    PrereleaseKind::Beta => 2,
                    PrereleaseKind::Rc => 3,
                },
                pre.number,
            ),
            (None, ..) => (4, 0),
        };
        (
            rank,
            pre_number,
            self.post,
            self.dev.unwrap_or(u64::MAX),
            &self.local,
        )
    }
}

/// Compare two release segments, padding the shorter one with zeros.
fn compare_release(this: &[u64], other: &[u64]) -> Ordering {
    let len = this.len().max(other.len());
    for index in 0..len {
        let left = this.get(index).copied().unwrap_or(0);
        let right = other.get(index).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => {}
            ordering => return ordering,
        }
    }
    Ordering::Equal
}

impl Ord for Version {
    /// `1.0.dev456 < 1.0a1 < 1.0a2.dev456 < 1.0a12 < 1.0b2.post345.dev456 < 1.0b2.post345
    /// < 1.0rc2 < 1.0 < 1.0.post456.dev34 < 1.0.post456`
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_release(&self.release, &other.release))
            .then_with(|| self.suffix_key().cmp(&other.suffix_key()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        // Trailing zeros don't participate in equality.
        let significant = self
            .release
            .iter()
            .rposition(|segment| *segment != 0)
            .map_or(0, |index| index + 1);
        self.release[..significant].hash(state);
        self.pre.hash(state);
        self.post.hash(state);
        self.dev.hash(state);
        self.local.hash(state);
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parse a version such as `1.19`, `1.0a1`, `1.0+abc.5` or `1!2012.2`.
    ///
    /// A trailing `.*` is rejected; wildcards are only meaningful in specifiers.
    fn from_str(version: &str) -> Result<Self, Self::Err> {
        let (parsed, wildcard) = Self::parse_pattern(version)?;
        if wildcard {
            return Err(VersionParseError::Wildcard(version.to_string()));
        }
        Ok(parsed)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let mut segments = self.release.iter();
        if let Some(first) = segments.next() {
            write!(f, "{first}")?;
        }
        for segment in segments {
            write!(f, ".{segment}")?;
        }
        if let Some(pre) = self.pre {
            write!(f, "{pre}")?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        let mut local = self.local.iter();
        if let Some(first) = local.next() {
            write!(f, "+{first}")?;
            for segment in local {
                write!(f, ".{segment}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        Self::from_str(&version).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests;
