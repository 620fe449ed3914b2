//! Environment markers, such as `python_version >= "3.8" and sys_platform == "linux"`.
//!
//! <https://packaging.python.org/en/latest/specifications/dependency-specifiers/#environment-markers>

use std::str::FromStr;

pub use environment::{MarkerEnvironment, StringVersion};
pub(crate) use parse::parse_marker_tree;
pub use tree::{
    ExtraOperator, MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerValueString,
    MarkerValueVersion,
};

use crate::Pep508Error;
use crate::scanner::Scanner;

mod environment;
mod parse;
mod tree;

impl FromStr for MarkerTree {
    type Err = Pep508Error;

    fn from_str(markers: &str) -> Result<Self, Self::Err> {
        parse_marker_tree(&mut Scanner::new(markers))
    }
}

#[cfg(test)]
mod tests;
