use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tracing::warn;

use pexl_normalize::ExtraName;
use pexl_pep440::VersionSpecifier;

use crate::marker::MarkerEnvironment;

/// Markers whose value is a PEP 440 version.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum MarkerValueVersion {
    ImplementationVersion,
    PythonFullVersion,
    PythonVersion,
}

impl Display for MarkerValueVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ImplementationVersion => "implementation_version",
            Self::PythonFullVersion => "python_full_version",
            Self::PythonVersion => "python_version",
        })
    }
}

/// Markers whose value is compared as a plain string.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MarkerValueString {
    ImplementationName,
    OsName,
    PlatformMachine,
    PlatformPythonImplementation,
    PlatformRelease,
    PlatformSystem,
    PlatformVersion,
    SysPlatform,
}

impl Display for MarkerValueString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ImplementationName => "implementation_name",
            Self::OsName => "os_name",
            Self::PlatformMachine => "platform_machine",
            Self::PlatformPythonImplementation => "platform_python_implementation",
            Self::PlatformRelease => "platform_release",
            Self::PlatformSystem => "platform_system",
            Self::PlatformVersion => "platform_version",
            Self::SysPlatform => "sys_platform",
        })
    }
}

/// One operand of a comparison as written, before it is typed into a [`MarkerExpression`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MarkerValue {
    MarkerEnvVersion(MarkerValueVersion),
    MarkerEnvString(MarkerValueString),
    Extra,
    QuotedString(String),
}

impl MarkerValue {
    /// Look up a marker name, accepting the dotted PEP 345 spellings such as `sys.platform`.
    pub fn from_key(key: &str) -> Option<Self> {
        use MarkerValueString as S;
        use MarkerValueVersion as V;

        Some(match key {
            "extra" => Self::Extra,
            "implementation_version" => Self::MarkerEnvVersion(V::ImplementationVersion),
            "python_full_version" => Self::MarkerEnvVersion(V::PythonFullVersion),
            "python_version" => Self::MarkerEnvVersion(V::PythonVersion),
            "implementation_name" => Self::MarkerEnvString(S::ImplementationName),
            "os_name" | "os.name" => Self::MarkerEnvString(S::OsName),
            "platform_machine" | "platform.machine" => Self::MarkerEnvString(S::PlatformMachine),
            "platform_python_implementation" | "platform.python_implementation" => {
                Self::MarkerEnvString(S::PlatformPythonImplementation)
            }
            "platform_release" => Self::MarkerEnvString(S::PlatformRelease),
            "platform_system" => Self::MarkerEnvString(S::PlatformSystem),
            "platform_version" | "platform.version" => Self::MarkerEnvString(S::PlatformVersion),
            "sys_platform" | "sys.platform" => Self::MarkerEnvString(S::SysPlatform),
            _ => return None,
        })
    }
}

impl Display for MarkerValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkerEnvVersion(key) => key.fmt(f),
            Self::MarkerEnvString(key) => key.fmt(f),
            Self::Extra => f.write_str("extra"),
            Self::QuotedString(value) => write_quoted(f, value),
        }
    }
}

/// Double quotes unless the value itself contains one.
fn write_quoted(f: &mut Formatter<'_>, value: &str) -> std::fmt::Result {
    if value.contains('"') {
        write!(f, "'{value}'")
    } else {
        write!(f, "\"{value}\"")
    }
}

/// A marker comparison.
///
/// `Contains` and `NotContains` are `in` and `not in` with the marker on the left, the form a
/// reversed `'win' in sys_platform` takes once the marker is moved to the front.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MarkerOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    TildeEqual,
    ExactEqual,
    In,
    NotIn,
    Contains,
    NotContains,
}

impl MarkerOperator {
    /// The operator that gives the same result with the operands swapped, if there is one.
    pub fn flip(self) -> Option<Self> {
        Some(match self {
            Self::Equal => Self::Equal,
            Self::NotEqual => Self::NotEqual,
            Self::ExactEqual => Self::ExactEqual,
            Self::GreaterThan => Self::LessThan,
            Self::GreaterEqual => Self::LessEqual,
            Self::LessThan => Self::GreaterThan,
            Self::LessEqual => Self::GreaterEqual,
            Self::In => Self::Contains,
            Self::NotIn => Self::NotContains,
            Self::Contains => Self::In,
            Self::NotContains => Self::NotIn,
            Self::TildeEqual => return None,
        })
    }

    fn is_containment(self) -> bool {
        matches!(
            self,
            Self::In | Self::NotIn | Self::Contains | Self::NotContains
        )
    }

    fn to_pep440(self) -> Option<pexl_pep440::Operator> {
        use pexl_pep440::Operator;

        Some(match self {
            Self::Equal => Operator::Equal,
            Self::NotEqual => Operator::NotEqual,
            Self::GreaterThan => Operator::GreaterThan,
            Self::GreaterEqual => Operator::GreaterThanEqual,
            Self::LessThan => Operator::LessThan,
            Self::LessEqual => Operator::LessThanEqual,
            Self::TildeEqual => Operator::TildeEqual,
            Self::ExactEqual => Operator::ExactEqual,
            Self::In | Self::NotIn | Self::Contains | Self::NotContains => return None,
        })
    }

    /// Compare a marker's string value, on the left, with a literal. `None` when the
    /// comparison has no string meaning.
    fn compare_str(self, value: &str, literal: &str) -> Option<bool> {
        Some(match self {
            Self::Equal | Self::ExactEqual => value == literal,
            Self::NotEqual => value != literal,
            Self::GreaterThan => value > literal,
            Self::GreaterEqual => value >= literal,
            Self::LessThan => value < literal,
            Self::LessEqual => value <= literal,
            Self::In => literal.contains(value),
            Self::NotIn => !literal.contains(value),
            Self::Contains => value.contains(literal),
            Self::NotContains => !value.contains(literal),
            Self::TildeEqual => return None,
        })
    }
}

impl FromStr for MarkerOperator {
    type Err = String;

    /// Parses the operators that may appear in a marker; `not in` is matched by the parser.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessEqual,
            "~=" => Self::TildeEqual,
            "===" => Self::ExactEqual,
            "in" => Self::In,
            other => return Err(format!("`{other}` is not a marker operator")),
        })
    }
}

impl Display for MarkerOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::TildeEqual => "~=",
            Self::ExactEqual => "===",
            Self::In | Self::Contains => "in",
            Self::NotIn | Self::NotContains => "not in",
        })
    }
}

/// `extra` only supports equality, against a normalized extra name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExtraOperator {
    Equal,
    NotEqual,
}

impl Display for ExtraOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
        })
    }
}

/// A single comparison, typed by the marker it tests.
///
/// Expressions written with the literal first, such as `'3.8' <= python_version`, are stored
/// with the marker first and the operator flipped.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MarkerExpression {
    /// `python_version >= "3.8"`
    Version {
        key: MarkerValueVersion,
        specifier: VersionSpecifier,
    },
    /// `python_version in "3.10 3.11"`, a substring test on the version's spelling.
    VersionIn {
        key: MarkerValueVersion,
        operator: MarkerOperator,
        value: String,
    },
    /// `sys_platform == "linux"`
    String {
        key: MarkerValueString,
        operator: MarkerOperator,
        value: String,
    },
    /// `extra == "test"`
    Extra {
        operator: ExtraOperator,
        name: ExtraName,
    },
    /// A comparison with no meaning, such as `os_name == python_version`, a version marker
    /// against a string that is not a version, or a reversed `~=`. Always false.
    Arbitrary {
        l_value: MarkerValue,
        operator: MarkerOperator,
        r_value: MarkerValue,
    },
}

impl MarkerExpression {
    /// Type a parsed `l_value operator r_value` comparison.
    pub fn new(l_value: MarkerValue, operator: MarkerOperator, r_value: MarkerValue) -> Self {
        let typed = match (&l_value, &r_value) {
            (MarkerValue::MarkerEnvVersion(key), MarkerValue::QuotedString(value)) => {
                Self::version(*key, operator, value)
            }
            (MarkerValue::QuotedString(value), MarkerValue::MarkerEnvVersion(key)) => operator
                .flip()
                .and_then(|operator| Self::version(*key, operator, value)),
            (MarkerValue::MarkerEnvString(key), MarkerValue::QuotedString(value)) => {
                Some(Self::String {
                    key: *key,
                    operator,
                    value: value.clone(),
                })
            }
            (MarkerValue::QuotedString(value), MarkerValue::MarkerEnvString(key)) => {
                operator.flip().map(|operator| Self::String {
                    key: *key,
                    operator,
                    value: value.clone(),
                })
            }
            (MarkerValue::Extra, MarkerValue::QuotedString(value))
            | (MarkerValue::QuotedString(value), MarkerValue::Extra) => Self::extra(operator, value),
            _ => None,
        };
        typed.unwrap_or(Self::Arbitrary {
            l_value,
            operator,
            r_value,
        })
    }

    fn version(key: MarkerValueVersion, operator: MarkerOperator, value: &str) -> Option<Self> {
        if operator.is_containment() {
            return Some(Self::VersionIn {
                key,
                operator,
                value: value.to_string(),
            });
        }
        let operator = operator.to_pep440()?;
        let specifier = VersionSpecifier::from_str(&format!("{operator}{value}")).ok()?;
        Some(Self::Version { key, specifier })
    }

    fn extra(operator: MarkerOperator, value: &str) -> Option<Self> {
        let operator = match operator {
            MarkerOperator::Equal => ExtraOperator::Equal,
            MarkerOperator::NotEqual => ExtraOperator::NotEqual,
            _ => return None,
        };
        let name = ExtraName::new(value).ok()?;
        Some(Self::Extra { operator, name })
    }

    pub fn evaluate(&self, env: &MarkerEnvironment, extras: &[ExtraName]) -> bool {
        match self {
            Self::Version { key, specifier } => specifier.contains(&key.lookup(env).version),
            Self::VersionIn {
                key,
                operator,
                value,
            } => operator
                .compare_str(&key.lookup(env).string, value)
                .unwrap_or(false),
            Self::String {
                key,
                operator,
                value,
            } => operator
                .compare_str(key.lookup(env), value)
                .unwrap_or_else(|| {
                    warn!("`{self}` compares strings with `{operator}`, evaluating to false");
                    false
                }),
            Self::Extra { operator, name } => {
                let active = extras.contains(name);
                match operator {
                    ExtraOperator::Equal => active,
                    ExtraOperator::NotEqual => !active,
                }
            }
            Self::Arbitrary { .. } => {
                warn!("`{self}` can never hold, evaluating to false");
                false
            }
        }
    }

    pub fn references_extra(&self) -> bool {
        match self {
            Self::Extra { .. } => true,
            Self::Arbitrary {
                l_value, r_value, ..
            } => *l_value == MarkerValue::Extra || *r_value == MarkerValue::Extra,
            Self::Version { .. } | Self::VersionIn { .. } | Self::String { .. } => false,
        }
    }
}

impl Display for MarkerExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version { key, specifier } => {
                let operator = specifier.operator().as_str();
                let rendered = specifier.to_string();
                let version = rendered.strip_prefix(operator).unwrap_or(&rendered);
                write!(f, "{key} {operator} ")?;
                write_quoted(f, version)
            }
            Self::VersionIn {
                key,
                operator,
                value,
            } => write_comparison(f, key, *operator, value),
            Self::String {
                key,
                operator,
                value,
            } => write_comparison(f, key, *operator, value),
            Self::Extra { operator, name } => {
                write!(f, "extra {operator} ")?;
                write_quoted(f, name.as_str())
            }
            Self::Arbitrary {
                l_value,
                operator,
                r_value,
            } => write!(f, "{l_value} {operator} {r_value}"),
        }
    }
}

/// Render a marker against a literal, putting the literal first for `Contains` forms.
fn write_comparison(
    f: &mut Formatter<'_>,
    key: impl Display,
    operator: MarkerOperator,
    value: &str,
) -> std::fmt::Result {
    if matches!(
        operator,
        MarkerOperator::Contains | MarkerOperator::NotContains
    ) {
        write_quoted(f, value)?;
        write!(f, " {operator} {key}")
    } else {
        write!(f, "{key} {operator} ")?;
        write_quoted(f, value)
    }
}

/// A boolean combination of marker expressions.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MarkerTree {
    Expression(MarkerExpression),
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
}

impl MarkerTree {
    /// Evaluate against a target environment with `extras` active.
    pub fn evaluate(&self, env: &MarkerEnvironment, extras: &[ExtraName]) -> bool {
        match self {
            Self::Expression(expression) => expression.evaluate(env, extras),
            Self::And(trees) => trees.iter().all(|tree| tree.evaluate(env, extras)),
            Self::Or(trees) => trees.iter().any(|tree| tree.evaluate(env, extras)),
        }
    }

    pub fn references_extra(&self) -> bool {
        match self {
            Self::Expression(expression) => expression.references_extra(),
            Self::And(trees) | Self::Or(trees) => trees.iter().any(Self::references_extra),
        }
    }

    /// Conjoin two trees, splicing the children of either side that is already a conjunction.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut trees = match self {
            Self::And(trees) => trees,
            tree => vec![tree],
        };
        match other {
            Self::And(more) => trees.extend(more),
            tree => trees.push(tree),
        }
        Self::And(trees)
    }
}

impl Display for MarkerTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (trees, separator) = match self {
            Self::Expression(expression) => return expression.fmt(f),
            Self::And(trees) => (trees, " and "),
            Self::Or(trees) => (trees, " or "),
        };
        for (index, tree) in trees.iter().enumerate() {
            if index > 0 {
                f.write_str(separator)?;
            }
            match tree {
                Self::Expression(expression) => write!(f, "{expression}")?,
                group => write!(f, "({group})")?,
            }
        }
        Ok(())
    }
}
