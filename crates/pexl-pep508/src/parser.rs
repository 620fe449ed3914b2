//! The requirement grammar, minus markers:
//!
//! ```text
//! specification = wsp* name wsp* extras? wsp* (('@' wsp* url) | versionspec)? wsp* (';' marker)?
//! ```

use std::ops::Range;
use std::str::FromStr;

use url::Url;

use pexl_normalize::{ExtraName, PackageName};
use pexl_pep440::VersionSpecifiers;

use crate::marker::parse_marker_tree;
use crate::scanner::Scanner;
use crate::{Pep508Error, Requirement, VersionOrUrl};

pub(crate) fn parse_requirement(scanner: &mut Scanner) -> Result<Requirement, Pep508Error> {
    scanner.skip_whitespace();
    let name = name(scanner)?;
    scanner.skip_whitespace();
    let extras = extras(scanner)?;
    scanner.skip_whitespace();
    let version_or_url = version_or_url(scanner)?;
    scanner.skip_whitespace();

    let marker = match scanner.consume(';') {
        Some(_) => Some(parse_marker_tree(scanner)?),
        None => {
            if let Some(c) = scanner.peek() {
                let start = scanner.offset();
                return Err(scanner.error(
                    format!("Expected ';' or the end of the requirement, found '{c}'"),
                    start..start + scanner.rest().trim_end().len(),
                ));
            }
            None
        }
    };

    Ok(Requirement {
        name,
        extras,
        version_or_url,
        marker,
    })
}

/// `^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$`, case insensitive.
fn name(scanner: &mut Scanner) -> Result<PackageName, Pep508Error> {
    let span = scanner.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if span.is_empty() {
        return Err(scanner.unexpected("a package name"));
    }
    let name = scanner.text(span.clone());
    let is_edge = |c: char| c.is_ascii_alphanumeric();
    if let Some(first) = name.chars().next().filter(|c| !is_edge(*c)) {
        return Err(scanner.error(
            format!("Package names must start with a letter or digit, found '{first}'"),
            span.start..span.start + 1,
        ));
    }
    if let Some(last) = name.chars().next_back().filter(|c| !is_edge(*c)) {
        return Err(scanner.error(
            format!("Package names must end with a letter or digit, found '{last}'"),
            span.end - 1..span.end,
        ));
    }
    PackageName::new(name).map_err(|err| scanner.error(err.to_string(), span))
}

/// `'[' wsp* (extra (wsp* ',' wsp* extra)*)? wsp* ']'`
fn extras(scanner: &mut Scanner) -> Result<Vec<ExtraName>, Pep508Error> {
    let Some(opened_at) = scanner.consume('[') else {
        return Ok(Vec::new());
    };
    let body = scanner.take_while(|c| c != ']');
    scanner.close(']', opened_at)?;

    let text = scanner.text(body.clone());
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut offset = body.start;
    let mut extras = Vec::new();
    for item in text.split(',') {
        let start = offset + (item.len() - item.trim_start().len());
        offset += item.len() + 1;
        let item = item.trim();
        if let Some(gap) = item.find(char::is_whitespace) {
            let next = item[gap..].trim_start();
            let at = start + (item.len() - next.len());
            let found = next.chars().next().unwrap_or_default();
            return Err(scanner.error(
                format!(
                    "Expected ',' or ']' after extra `{}`, found '{found}'",
                    &item[..gap]
                ),
                at..at + found.len_utf8(),
            ));
        }
        let extra = ExtraName::new(item)
            .map_err(|err| scanner.error(err.to_string(), start..start + item.len().max(1)))?;
        extras.push(extra);
    }
    Ok(extras)
}

fn version_or_url(scanner: &mut Scanner) -> Result<Option<VersionOrUrl>, Pep508Error> {
    match scanner.peek() {
        None | Some(';') => Ok(None),
        Some('@') => {
            scanner.bump();
            url(scanner).map(|url| Some(VersionOrUrl::Url(url)))
        }
        Some('(') => {
            let opened_at = scanner.offset();
            scanner.bump();
            let span = scanner.take_while(|c| c != ')');
            let specifiers = specifiers(scanner, span)?;
            scanner.close(')', opened_at)?;
            Ok(Some(VersionOrUrl::VersionSpecifier(specifiers)))
        }
        Some('<' | '=' | '>' | '~' | '!') => {
            let span = scanner.take_while(|c| c != ';');
            Ok(Some(VersionOrUrl::VersionSpecifier(specifiers(
                scanner, span,
            )?)))
        }
        Some(_) => Err(scanner.unexpected("a version specifier, `@ <url>` or `;`")),
    }
}

/// A direct reference runs to the next whitespace, so a marker after it needs a space before
/// the `;`.
fn url(scanner: &mut Scanner) -> Result<Url, Pep508Error> {
    scanner.skip_whitespace();
    let span = scanner.take_while(|c| !c.is_whitespace());
    if span.is_empty() {
        return Err(scanner.unexpected("a URL after '@'"));
    }
    Url::parse(scanner.text(span.clone())).map_err(|err| scanner.url_error(err, span))
}

fn specifiers(scanner: &Scanner, span: Range<usize>) -> Result<VersionSpecifiers, Pep508Error> {
    VersionSpecifiers::from_str(scanner.text(span.clone())).map_err(|err| {
        let clause = err.span();
        scanner.error(
            err.kind().to_string(),
            span.start + clause.start..span.start + clause.end,
        )
    })
}
