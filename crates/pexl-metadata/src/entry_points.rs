//! The `entry_points.txt` format.
//!
//! See <https://packaging.python.org/en/latest/specifications/entry-points/#file-format>.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Entry points by group, then by name.
pub type EntryMap = BTreeMap<String, BTreeMap<String, EntryPoint>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryPointError {
    #[error("Invalid entry point specification: {0}.")]
    InvalidSpecification(String),
    #[error(
        "Failed to parse entry_points.txt, encountered an entry point with no group on line {index}: {line}"
    )]
    MissingGroup { index: usize, line: String },
}

/// A named reference to a module, or to a callable reached through a module's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// `name = module`
    Module { name: String, module: String },
    /// `name = module:attr.chain`
    Callable {
        name: String,
        module: String,
        attrs: Vec<String>,
    },
}

impl EntryPoint {
    /// Parse `name = module[:attr.chain]`.
    pub fn parse(spec: &str) -> Result<Self, EntryPointError> {
        let invalid = || EntryPointError::InvalidSpecification(spec.to_string());
        let mut components = spec.split('=');
        let (Some(name), Some(value), None) =
            (components.next(), components.next(), components.next())
        else {
            return Err(invalid());
        };

        let name = name.trim().to_string();
        let value = value.trim();
        match value.split_once(':') {
            None => Ok(Self::Module {
                name,
                module: value.to_string(),
            }),
            Some((_, "")) => Err(invalid()),
            Some((module, attrs)) => Ok(Self::Callable {
                name,
                module: module.trim().to_string(),
                attrs: attrs.trim().split('.').map(ToString::to_string).collect(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Module { name, .. } | Self::Callable { name, .. } => name,
        }
    }

    pub fn module(&self) -> &str {
        match self {
            Self::Module { module, .. } | Self::Callable { module, .. } => module,
        }
    }

    /// The attribute chain selecting a callable, empty for module entry points.
    pub fn attrs(&self) -> &[String] {
        match self {
            Self::Module { .. } => &[],
            Self::Callable { attrs, .. } => attrs,
        }
    }
}

impl Display for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module { name, module } => write!(f, "{name} = {module}"),
            Self::Callable {
                name,
                module,
                attrs,
            } => write!(f, "{name} = {module}:{}", attrs.join(".")),
        }
    }
}

/// The trimmed, non-blank lines of a metadata file that are not `#` comments.
pub fn metadata_lines(content: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(content)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Parse the contents of an `entry_points.txt` file.
pub fn parse_entry_map(content: &[u8]) -> Result<EntryMap, EntryPointError> {
    let mut entry_map = EntryMap::new();
    let mut group: Option<String> = None;
    for (index, line) in metadata_lines(content).into_iter().enumerate() {
        if let Some(name) = line.strip_prefix('[').and_then(|line| line.strip_suffix(']')) {
            group = Some(name.to_string());
            continue;
        }
        let Some(group) = group.as_ref().filter(|group| !group.is_empty()) else {
            return Err(EntryPointError::MissingGroup {
                index: index + 1,
                line,
            });
        };
        let entry_point = EntryPoint::parse(&line)?;
        entry_map
            .entry(group.clone())
            .or_default()
            .insert(entry_point.name().to_string(), entry_point);
    }
    Ok(entry_map)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::{EntryPoint, EntryPointError, metadata_lines, parse_entry_map};

    #[test]
    fn parse_entry_points() {
        assert_eq!(
            EntryPoint::parse("pex = pex.bin.pex:main").unwrap(),
            EntryPoint::Callable {
                name: "pex".to_string(),
                module: "pex.bin.pex".to_string(),
                attrs: vec!["main".to_string()],
            }
        );
        assert_eq!(
            EntryPoint::parse("plugin=my.module").unwrap(),
            EntryPoint::Module {
                name: "plugin".to_string(),
                module: "my.module".to_string(),
            }
        );
        let callable = EntryPoint::parse("cli = app:Cli.run").unwrap();
        assert_eq!(callable.attrs(), ["Cli", "run"]);
        assert_eq!(callable.to_string(), "cli = app:Cli.run");
    }

    #[test]
    fn invalid_entry_points() {
        for spec in ["no-equals", "a = b = c", "empty = module:"] {
            assert_eq!(
                EntryPoint::parse(spec),
                Err(EntryPointError::InvalidSpecification(spec.to_string()))
            );
        }
    }

    #[test]
    fn entry_map() {
        let entry_map = parse_entry_map(
            indoc! {"
                # Generated by setuptools.
                [console_scripts]
                black = black:patched_main
                blackd = blackd:patched_main [d]

                [distutils.commands]
                build = mypkg.build
            "}
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(entry_map.len(), 2);
        assert_eq!(
            entry_map["console_scripts"]["black"].to_string(),
            "black = black:patched_main"
        );
        assert_eq!(
            entry_map["distutils.commands"]["build"].module(),
            "mypkg.build"
        );
    }

    #[test]
    fn entry_without_group() {
        let err = parse_entry_map(b"\n# comment\nfoo = bar:baz\n").unwrap_err();
        assert_snapshot!(err, @"Failed to parse entry_points.txt, encountered an entry point with no group on line 1: foo = bar:baz");
    }

    #[test]
    fn lines() {
        assert_eq!(
            metadata_lines(b"  a  \n\n# b\n c\r\n"),
            ["a".to_string(), "c".to_string()]
        );
    }
}
