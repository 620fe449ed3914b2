use std::fmt::{Display, Formatter};

use thiserror::Error;
use unicode_width::UnicodeWidthStr;

/// A failure to parse a requirement or marker, pointing at the offending span of the input.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub struct Pep508Error {
    pub message: Pep508ErrorSource,
    /// Byte offset of the span.
    pub start: usize,
    /// Byte length of the span.
    pub len: usize,
    pub input: String,
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum Pep508ErrorSource {
    #[error("{0}")]
    String(String),
    #[error(transparent)]
    UrlError(#[from] url::ParseError),
}

impl Display for Pep508Error {
    /// The message, the input, then carets under the span measured in terminal columns.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let column = |offset: usize| {
            self.input
                .get(..offset)
                .map_or(offset, UnicodeWidthStr::width)
        };
        let indent = column(self.start.min(self.input.len()));
        let end = (self.start + self.len).min(self.input.len());
        let carets = column(end).saturating_sub(indent).max(1);
        writeln!(f, "{}", self.message)?;
        writeln!(f, "{}", self.input)?;
        write!(f, "{}{}", " ".repeat(indent), "^".repeat(carets))
    }
}
