use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::operator::OperatorParseError;
use crate::{Operator, Version, VersionParseError};

/// The right hand side of a clause: a version, or the raw text of a `===` clause.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Operand {
    Version(Version),
    Arbitrary(String),
}

/// A single version clause such as `>=1.19`, `==1.1.*` or `===foobar`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionSpecifier {
    operator: Operator,
    operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionSpecifierParseError {
    #[error("Version clause is missing a comparison such as `==` or `>=`")]
    MissingOperator,
    #[error("Version clause ends after its comparison, expected a version")]
    MissingVersion,
    #[error(transparent)]
    InvalidOperator(#[from] OperatorParseError),
    #[error(transparent)]
    InvalidVersion(#[from] VersionParseError),
    #[error("`{0}` does not accept a wildcard version")]
    OperatorWithStar(Operator),
    #[error("`{operator}` does not accept a local version label (`+{local}`)")]
    OperatorLocalCombo { operator: Operator, local: String },
    #[error("`~=` needs a release with at least two components")]
    CompatibleRelease,
}

impl VersionSpecifier {
    /// Pair `operator` with `version`, rejecting combinations PEP 440 forbids.
    pub fn from_version(
        operator: Operator,
        version: Version,
    ) -> Result<Self, VersionSpecifierParseError> {
        match operator {
            Operator::ExactEqual => return Ok(Self::arbitrary_equal(version.to_string())),
            Operator::TildeEqual if version.release().len() < 2 => {
                return Err(VersionSpecifierParseError::CompatibleRelease);
            }
            _ => {}
        }
        if version.is_local() && !operator.admits_local() {
            let local = version
                .local()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".");
            return Err(VersionSpecifierParseError::OperatorLocalCombo { operator, local });
        }
        Ok(Self {
            operator,
            operand: Operand::Version(version),
        })
    }

    pub fn equals_version(version: Version) -> Self {
        Self {
            operator: Operator::Equal,
            operand: Operand::Version(version),
        }
    }

    pub fn arbitrary_equal(version: impl Into<String>) -> Self {
        Self {
            operator: Operator::ExactEqual,
            operand: Operand::Arbitrary(version.into()),
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// `None` for a `===` clause.
    pub fn version(&self) -> Option<&Version> {
        match &self.operand {
            Operand::Version(version) => Some(version),
            Operand::Arbitrary(_) => None,
        }
    }

    pub fn arbitrary(&self) -> Option<&str> {
        match &self.operand {
            Operand::Arbitrary(raw) => Some(raw),
            Operand::Version(_) => None,
        }
    }

    /// Whether the clause itself names a pre-release, which lets it match pre-releases.
    pub fn allows_prereleases(&self) -> bool {
        match &self.operand {
            Operand::Arbitrary(raw) => {
                Version::from_str(raw).is_ok_and(|version| version.any_prerelease())
            }
            Operand::Version(version) => {
                matches!(
                    self.operator,
                    Operator::Equal
                        | Operator::EqualStar
                        | Operator::TildeEqual
                        | Operator::LessThanEqual
                        | Operator::GreaterThanEqual
                ) && version.any_prerelease()
            }
        }
    }

    /// Whether `candidate` satisfies the clause. Pre-release policy is left to the caller.
    pub fn contains(&self, candidate: &Version) -> bool {
        let version = match &self.operand {
            Operand::Version(version) => version,
            Operand::Arbitrary(raw) => {
                return candidate.to_string().eq_ignore_ascii_case(raw.trim());
            }
        };

        // A candidate's local label only counts against a clause that has one.
        let candidate = if version.is_local() {
            Cow::Borrowed(candidate)
        } else {
            Cow::Owned(candidate.clone().without_local())
        };
        let candidate = candidate.as_ref();

        match self.operator {
            Operator::Equal => candidate == version,
            Operator::NotEqual => candidate != version,
            Operator::EqualStar => starts_with(candidate, version, version.release()),
            Operator::NotEqualStar => !starts_with(candidate, version, version.release()),
            Operator::TildeEqual => {
                let prefix = version.release().split_last().map_or(&[][..], |(_, rest)| rest);
                candidate >= version && starts_with(candidate, version, prefix)
            }
            Operator::LessThanEqual => candidate <= version,
            Operator::GreaterThanEqual => candidate >= version,
            // `<3.1` excludes `3.1.dev0` unless the clause is itself a pre-release.
            Operator::LessThan => {
                candidate < version
                    && (version.any_prerelease()
                        || !candidate.any_prerelease()
                        || !candidate.same_base(version))
            }
            // `>3.1` excludes `3.1.post0` unless the clause is itself a post-release.
            Operator::GreaterThan => {
                candidate > version
                    && (version.is_post() || !candidate.is_post() || !candidate.same_base(version))
            }
            Operator::ExactEqual => false,
        }
    }
}

/// Whether `candidate` is in `version`'s epoch and its zero padded release begins with `prefix`.
fn starts_with(candidate: &Version, version: &Version, prefix: &[u64]) -> bool {
    candidate.epoch() == version.epoch()
        && prefix
            .iter()
            .enumerate()
            .all(|(index, part)| candidate.release().get(index).copied().unwrap_or(0) == *part)
}

impl FromStr for VersionSpecifier {
    type Err = VersionSpecifierParseError;

    fn from_str(clause: &str) -> Result<Self, Self::Err> {
        let clause = clause.trim();
        let Some((operator, rest)) = Operator::split_prefix(clause) else {
            let junk = clause
                .split(|c: char| c.is_ascii_alphanumeric() || c.is_whitespace())
                .next()
                .unwrap_or_default();
            return Err(if junk.is_empty() {
                VersionSpecifierParseError::MissingOperator
            } else {
                OperatorParseError(junk.to_string()).into()
            });
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(VersionSpecifierParseError::MissingVersion);
        }
        if operator == Operator::ExactEqual {
            return Ok(Self::arbitrary_equal(rest));
        }

        let (version, wildcard) = Version::parse_pattern(rest)?;
        let operator = match (wildcard, operator.wildcard()) {
            (false, _) => operator,
            (true, Some(wildcard)) => wildcard,
            (true, None) => return Err(VersionSpecifierParseError::OperatorWithStar(operator)),
        };
        Self::from_version(operator, version)
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator.as_str())?;
        match &self.operand {
            Operand::Version(version) if self.operator.is_wildcard() => write!(f, "{version}.*"),
            Operand::Version(version) => write!(f, "{version}"),
            Operand::Arbitrary(raw) => f.write_str(raw),
        }
    }
}
