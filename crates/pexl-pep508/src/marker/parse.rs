//! Recursive descent over the marker grammar:
//!
//! ```text
//! marker      = marker_or
//! marker_or   = marker_and ('or' marker_and)*
//! marker_and  = marker_atom ('and' marker_atom)*
//! marker_atom = '(' marker ')' | value marker_op value
//! marker_op   = version_cmp | 'in' | 'not' 'in'
//! ```

use std::str::FromStr;

use crate::Pep508Error;
use crate::marker::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue};
use crate::scanner::Scanner;

/// Parse markers running to the end of the input.
pub(crate) fn parse_marker_tree(scanner: &mut Scanner) -> Result<MarkerTree, Pep508Error> {
    let tree = disjunction(scanner)?;
    scanner.skip_whitespace();
    if let Some(c) = scanner.peek() {
        let start = scanner.offset();
        let end = start + scanner.rest().trim_end().len();
        return Err(scanner.error(
            format!("Expected 'and' or 'or' between marker expressions, found '{c}'"),
            start..end,
        ));
    }
    Ok(tree)
}

fn disjunction(scanner: &mut Scanner) -> Result<MarkerTree, Pep508Error> {
    let mut trees = vec![conjunction(scanner)?];
    while scanner.consume_keyword("or") {
        trees.push(conjunction(scanner)?);
    }
    Ok(group(trees, MarkerTree::Or))
}

fn conjunction(scanner: &mut Scanner) -> Result<MarkerTree, Pep508Error> {
    let mut trees = vec![atom(scanner)?];
    while scanner.consume_keyword("and") {
        trees.push(atom(scanner)?);
    }
    Ok(group(trees, MarkerTree::And))
}

/// A lone tree stands for itself rather than a group of one.
fn group(trees: Vec<MarkerTree>, combine: fn(Vec<MarkerTree>) -> MarkerTree) -> MarkerTree {
    match <[MarkerTree; 1]>::try_from(trees) {
        Ok([tree]) => tree,
        Err(trees) => combine(trees),
    }
}

fn atom(scanner: &mut Scanner) -> Result<MarkerTree, Pep508Error> {
    scanner.skip_whitespace();
    if let Some(opened_at) = scanner.consume('(') {
        let tree = disjunction(scanner)?;
        scanner.skip_whitespace();
        scanner.close(')', opened_at)?;
        return Ok(tree);
    }

    let l_value = value(scanner)?;
    scanner.skip_whitespace();
    let operator = operator(scanner)?;
    let r_value = value(scanner)?;
    Ok(MarkerTree::Expression(MarkerExpression::new(
        l_value, operator, r_value,
    )))
}

fn value(scanner: &mut Scanner) -> Result<MarkerValue, Pep508Error> {
    scanner.skip_whitespace();
    let start = scanner.offset();
    if let Some(quote @ ('\'' | '"')) = scanner.peek() {
        scanner.bump();
        let span = scanner.take_while(|c| c != quote);
        let value = scanner.text(span).to_string();
        scanner.close(quote, start)?;
        return Ok(MarkerValue::QuotedString(value));
    }

    let span = scanner.take_while(|c| {
        !c.is_whitespace() && !matches!(c, '<' | '=' | '>' | '!' | '~' | '(' | ')' | '\'' | '"')
    });
    if span.is_empty() {
        return Err(scanner.unexpected("a marker name or a quoted string"));
    }
    let key = scanner.text(span.clone());
    MarkerValue::from_key(key)
        .ok_or_else(|| scanner.error(format!("'{key}' is not a marker name"), span))
}

fn operator(scanner: &mut Scanner) -> Result<MarkerOperator, Pep508Error> {
    if scanner.consume_keyword("not") {
        return if scanner.consume_keyword("in") {
            Ok(MarkerOperator::NotIn)
        } else {
            scanner.skip_whitespace();
            Err(scanner.unexpected("'in' after 'not'"))
        };
    }

    let span = scanner.take_while(|c| !c.is_whitespace() && !matches!(c, '\'' | '"'));
    if span.is_empty() {
        return Err(scanner.unexpected("a marker operator"));
    }
    let text = scanner.text(span.clone());
    MarkerOperator::from_str(text).map_err(|_| {
        scanner.error(
            format!("Expected a marker operator such as '>=' or 'not in', found '{text}'"),
            span,
        )
    })
}
