//! Dependency specifiers as found in `Requires-Dist` metadata and `requires.txt`, following
//! [PEP 508](https://peps.python.org/pep-0508/), with the environment markers used to decide
//! which of them apply to a lock target.
//!
//! Errors carry the byte span of the problem and render it underlined:
//!
//! ```text
//! Expected ',' or ']' after extra `d`, found 'j'
//! black[d jupyter]
//!         ^
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

pub use error::{Pep508Error, Pep508ErrorSource};
pub use marker::{
    ExtraOperator, MarkerEnvironment, MarkerExpression, MarkerOperator, MarkerTree, MarkerValue,
    MarkerValueString, MarkerValueVersion, StringVersion,
};
use pexl_normalize::{ExtraName, PackageName};
use pexl_pep440::VersionSpecifiers;

use crate::parser::parse_requirement;
use crate::scanner::Scanner;

mod error;
mod marker;
mod parser;
mod scanner;

/// One line of `Requires-Dist`, `requires.txt` or a requirements file, such as
/// `requests[security]>=2.8.1; python_version > "3.8"`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Requirement {
    pub name: PackageName,
    pub extras: Vec<ExtraName>,
    pub version_or_url: Option<VersionOrUrl>,
    pub marker: Option<MarkerTree>,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum VersionOrUrl {
    /// `>= 1.19, < 2`
    VersionSpecifier(VersionSpecifiers),
    /// `@ https://example.org/foo-1.0-py3-none-any.whl`
    Url(Url),
}

/// Write `items` separated by `separator`.
fn write_joined<T: Display>(
    f: &mut Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    separator: &str,
) -> std::fmt::Result {
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Requirement {
    /// The compact form `name[extra,...]spec,spec; marker`, with ` @ url ` for direct references.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            f.write_str("[")?;
            write_joined(f, &self.extras, ",")?;
            f.write_str("]")?;
        }
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => write_joined(f, specifiers, ",")?,
            // The URL swallows everything up to whitespace, including a `;`.
            Some(VersionOrUrl::Url(url)) if self.marker.is_some() => write!(f, " @ {url} ")?,
            Some(VersionOrUrl::Url(url)) => write!(f, " @ {url}")?,
            None => {}
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

impl FromStr for Requirement {
    type Err = Pep508Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_requirement(&mut Scanner::new(input))
    }
}

impl Requirement {
    /// Whether this requirement applies to `env` with `extras` active. No marker means always.
    pub fn evaluate_markers(&self, env: &MarkerEnvironment, extras: &[ExtraName]) -> bool {
        self.marker
            .as_ref()
            .is_none_or(|marker| marker.evaluate(env, extras))
    }

    pub fn specifiers(&self) -> Option<&VersionSpecifiers> {
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => Some(specifiers),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match &self.version_or_url {
            Some(VersionOrUrl::Url(url)) => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
