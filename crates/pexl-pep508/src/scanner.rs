use std::ops::Range;

use crate::{Pep508Error, Pep508ErrorSource};

/// A forward-only reader over a dependency specifier, tracking byte offsets for error spans.
pub(crate) struct Scanner<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    pub(crate) fn text(&self, span: Range<usize>) -> &'a str {
        &self.input[span]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// Consume `expected` if it is next, returning its offset.
    pub(crate) fn consume(&mut self, expected: char) -> Option<usize> {
        let at = self.offset;
        (self.peek() == Some(expected)).then(|| {
            self.offset += expected.len_utf8();
            at
        })
    }

    pub(crate) fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Consume the longest run of characters matching `predicate` and return its span.
    pub(crate) fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> Range<usize> {
        let start = self.offset;
        let len = self
            .rest()
            .find(|c: char| !predicate(c))
            .unwrap_or(self.rest().len());
        self.offset += len;
        start..self.offset
    }

    /// Consume `word` after optional whitespace, provided it stands alone rather than prefixing a
    /// longer identifier.
    pub(crate) fn consume_keyword(&mut self, word: &str) -> bool {
        let skipped = self.rest().len() - self.rest().trim_start().len();
        let Some(after) = self.rest()[skipped..].strip_prefix(word) else {
            return false;
        };
        if after
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.'))
        {
            return false;
        }
        self.offset += skipped + word.len();
        true
    }

    /// A grammar error covering `span`.
    pub(crate) fn error(&self, message: impl Into<String>, span: Range<usize>) -> Pep508Error {
        Pep508Error {
            message: Pep508ErrorSource::String(message.into()),
            start: span.start,
            len: span.len(),
            input: self.input.to_string(),
        }
    }

    /// A grammar error about the next character, or the end of input if there is none.
    pub(crate) fn unexpected(&self, expected: &str) -> Pep508Error {
        match self.peek() {
            Some(c) => self.error(
                format!("Expected {expected}, found '{c}'"),
                self.offset..self.offset + c.len_utf8(),
            ),
            None => self.error(
                format!("Expected {expected}, found end of input"),
                self.offset..self.offset + 1,
            ),
        }
    }

    pub(crate) fn url_error(&self, err: url::ParseError, span: Range<usize>) -> Pep508Error {
        Pep508Error {
            message: Pep508ErrorSource::UrlError(err),
            start: span.start,
            len: span.len(),
            input: self.input.to_string(),
        }
    }

    /// Consume the `closing` delimiter matching the one opened at `opened_at`.
    pub(crate) fn close(&mut self, closing: char, opened_at: usize) -> Result<(), Pep508Error> {
        match self.peek() {
            Some(c) if c == closing => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(
                format!("Expected `{closing}`, found '{c}'"),
                self.offset..self.offset + c.len_utf8(),
            )),
            None => Err(self.error(
                format!("Missing closing `{closing}`"),
                opened_at..opened_at + 1,
            )),
        }
    }
}
