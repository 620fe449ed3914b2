use std::fmt;
use std::str::FromStr;

/// The comparison in a version clause.
///
/// `==` and `!=` have wildcard twins (`==1.2.*`, `!=1.2.*`) that render the same way but match
/// by release prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Equal,
    EqualStar,
    /// `===`, compared as strings rather than versions.
    ExactEqual,
    NotEqual,
    NotEqualStar,
    /// `~=`, the compatible release clause.
    TildeEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal | Self::EqualStar => "==",
            Self::ExactEqual => "===",
            Self::NotEqual | Self::NotEqualStar => "!=",
            Self::TildeEqual => "~=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        }
    }

    /// Split a leading operator off `input`, preferring the longest match.
    pub(crate) fn split_prefix(input: &str) -> Option<(Self, &str)> {
        let (operator, width) = match input.as_bytes() {
            [b'=', b'=', b'=', ..] => (Self::ExactEqual, 3),
            [b'=', b'=', ..] => (Self::Equal, 2),
            [b'!', b'=', ..] => (Self::NotEqual, 2),
            [b'~', b'=', ..] => (Self::TildeEqual, 2),
            [b'<', b'=', ..] => (Self::LessThanEqual, 2),
            [b'>', b'=', ..] => (Self::GreaterThanEqual, 2),
            [b'<', ..] => (Self::LessThan, 1),
            [b'>', ..] => (Self::GreaterThan, 1),
            _ => return None,
        };
        Some((operator, &input[width..]))
    }

    /// The prefix-matching form of this operator, if it has one.
    pub(crate) fn wildcard(self) -> Option<Self> {
        match self {
            Self::Equal | Self::EqualStar => Some(Self::EqualStar),
            Self::NotEqual | Self::NotEqualStar => Some(Self::NotEqualStar),
            _ => None,
        }
    }

    pub(crate) fn is_wildcard(self) -> bool {
        matches!(self, Self::EqualStar | Self::NotEqualStar)
    }

    /// Whether a clause with this operator may name a version with a local label.
    pub(crate) fn admits_local(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual | Self::ExactEqual)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a version comparison, expected one of `~=` `==` `!=` `<=` `>=` `<` `>` `===`")]
pub struct OperatorParseError(pub(crate) String);

impl FromStr for Operator {
    type Err = OperatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::split_prefix(s) {
            Some((operator, "")) => Ok(operator),
            _ => Err(OperatorParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
